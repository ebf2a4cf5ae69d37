use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{percent_of, Category, Cents, Expense, PaymentMethod};

/// Aggregates over a set of expenses. Keys absent from the input are
/// absent from the maps, never zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseStats {
    pub total: Cents,
    pub count: usize,
    pub by_category: BTreeMap<Category, Cents>,
    pub by_payment_method: BTreeMap<PaymentMethod, Cents>,
}

impl ExpenseStats {
    pub fn category_total(&self, category: &Category) -> Cents {
        self.by_category.get(category).copied().unwrap_or(0)
    }

    /// The category with the largest spend. Ties go to the lowest key.
    pub fn top_category(&self) -> Option<(&Category, Cents)> {
        let mut best: Option<(&Category, Cents)> = None;
        for (category, &amount) in &self.by_category {
            if best.is_none_or(|(_, top)| amount > top) {
                best = Some((category, amount));
            }
        }
        best
    }

    pub fn average(&self) -> Cents {
        if self.count == 0 {
            0
        } else {
            self.total / self.count as i64
        }
    }
}

/// Reduce expenses into totals. The result depends only on the set of
/// expenses, not on their order.
pub fn compute_stats<'a, I>(expenses: I) -> ExpenseStats
where
    I: IntoIterator<Item = &'a Expense>,
{
    expenses
        .into_iter()
        .fold(ExpenseStats::default(), |mut stats, expense| {
            stats.total += expense.amount_cents;
            stats.count += 1;
            *stats
                .by_category
                .entry(expense.category.clone())
                .or_insert(0) += expense.amount_cents;
            *stats
                .by_payment_method
                .entry(expense.payment_method)
                .or_insert(0) += expense.amount_cents;
            stats
        })
}

/// One slice of a breakdown chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share<K> {
    pub key: K,
    pub amount: Cents,
    pub percentage: f64,
}

/// Turn a per-key map into chart slices, largest first.
pub fn breakdown<K: Clone + Ord>(totals: &BTreeMap<K, Cents>) -> Vec<Share<K>> {
    let whole: Cents = totals.values().sum();
    let mut shares: Vec<Share<K>> = totals
        .iter()
        .map(|(key, &amount)| Share {
            key: key.clone(),
            amount,
            percentage: percent_of(amount, whole),
        })
        .collect();
    shares.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.key.cmp(&b.key)));
    shares
}
