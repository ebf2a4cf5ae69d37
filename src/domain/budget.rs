use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{percent_of, Category, Cents, ExpenseStats, Scope, ScopeFilter, Scoped, UserId};

pub type BudgetId = Uuid;

/// Share of the limit above which a budget is flagged as close to its limit.
pub const BUDGET_WARNING_PERCENT: f64 = 80.0;

/// A monthly spending ceiling for one category. Keyed by
/// `(category, scope, owner)`: setting a budget for an existing key
/// replaces its limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub id: BudgetId,
    pub category: Category,
    pub monthly_limit_cents: Cents,
    pub scope: Scope,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl CategoryBudget {
    pub fn new(category: Category, monthly_limit_cents: Cents, filter: ScopeFilter) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            monthly_limit_cents,
            scope: filter.scope,
            owner: match filter.scope {
                Scope::Personal => filter.owner,
                Scope::Family => None,
            },
            created_at: Utc::now(),
        }
    }

    /// Spending against this budget given a period's statistics.
    pub fn usage(&self, stats: &ExpenseStats) -> BudgetUsage {
        let spent = stats.category_total(&self.category);
        let percentage = percent_of(spent, self.monthly_limit_cents);
        let status = if percentage > 100.0 {
            BudgetStatus::Exceeded
        } else if percentage > BUDGET_WARNING_PERCENT {
            BudgetStatus::Warning
        } else {
            BudgetStatus::OnTrack
        };

        BudgetUsage {
            category: self.category.clone(),
            limit: self.monthly_limit_cents,
            spent,
            remaining: self.monthly_limit_cents - spent,
            percentage,
            status,
        }
    }
}

impl Scoped for CategoryBudget {
    fn scope(&self) -> Scope {
        self.scope
    }

    fn owner(&self) -> Option<UserId> {
        self.owner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::OnTrack => "on_track",
            BudgetStatus::Warning => "warning",
            BudgetStatus::Exceeded => "exceeded",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of a budget's limit has been spent in a period.
/// `remaining` goes negative once the limit is exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub category: Category,
    pub limit: Cents,
    pub spent: Cents,
    pub remaining: Cents,
    pub percentage: f64,
    pub status: BudgetStatus,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{compute_stats, Expense, PaymentMethod};

    fn stats_with(category: &str, amount: Cents) -> ExpenseStats {
        let expense = Expense::new(
            "gasto",
            amount,
            Category::new(category),
            PaymentMethod::Pix,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        );
        compute_stats([&expense])
    }

    #[test]
    fn test_usage_statuses() {
        let budget = CategoryBudget::new(Category::new("lazer"), 10000, ScopeFilter::family());

        assert_eq!(budget.usage(&stats_with("lazer", 5000)).status, BudgetStatus::OnTrack);
        assert_eq!(budget.usage(&stats_with("lazer", 8000)).status, BudgetStatus::OnTrack);
        assert_eq!(budget.usage(&stats_with("lazer", 8100)).status, BudgetStatus::Warning);
        assert_eq!(budget.usage(&stats_with("lazer", 10000)).status, BudgetStatus::Warning);

        let exceeded = budget.usage(&stats_with("lazer", 12500));
        assert_eq!(exceeded.status, BudgetStatus::Exceeded);
        assert_eq!(exceeded.remaining, -2500);
    }

    #[test]
    fn test_zero_limit_is_zero_percent() {
        let budget = CategoryBudget::new(Category::new("lazer"), 0, ScopeFilter::family());
        let usage = budget.usage(&stats_with("lazer", 5000));
        assert_eq!(usage.percentage, 0.0);
        assert!(!usage.percentage.is_nan());
        assert_eq!(usage.status, BudgetStatus::OnTrack);
    }

    #[test]
    fn test_unspent_category() {
        let budget = CategoryBudget::new(Category::new("saude"), 20000, ScopeFilter::family());
        let usage = budget.usage(&stats_with("lazer", 5000));
        assert_eq!(usage.spent, 0);
        assert_eq!(usage.remaining, 20000);
    }
}
