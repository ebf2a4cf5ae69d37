use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{
    add_months, compute_stats, filter_by_date_range, filter_by_scope, first_of_month, Cents,
    DateRange, Expense, Installment, ScopeFilter,
};

/// Length of the rolling history window, in months.
pub const HISTORY_MONTHS: usize = 6;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// One point of the monthly history chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// First day of the month
    pub month: NaiveDate,
    pub label: String,
    pub expenses: Cents,
    pub installments: Cents,
    pub total: Cents,
}

/// Short chart label for a month, e.g. "mar/24".
pub fn month_label(month: NaiveDate) -> String {
    format!(
        "{}/{:02}",
        MONTH_ABBREVIATIONS[month.month0() as usize],
        month.year().rem_euclid(100)
    )
}

/// Sum of installment amounts scheduled for the month of `month`.
///
/// This is the scheduled view: a plan counts in every month of its term
/// whether or not that installment was paid. Use
/// [`Installment::outstanding_in`] for the payment-aware figure.
pub fn scheduled_installments_in_month<'a, I>(installments: I, month: NaiveDate) -> Cents
where
    I: IntoIterator<Item = &'a Installment>,
{
    installments
        .into_iter()
        .filter(|installment| installment.scheduled_in_month(month))
        .map(|installment| installment.installment_amount_cents)
        .sum()
}

/// The last [`HISTORY_MONTHS`] calendar months ending with the month of
/// `today`, oldest first. Each point adds the month's expenses to the
/// installments scheduled for that month.
pub fn build_history(
    expenses: &[Expense],
    installments: &[Installment],
    filter: &ScopeFilter,
    today: NaiveDate,
) -> Vec<MonthlyTotal> {
    let current_month = first_of_month(today);
    let installments = filter_by_scope(installments, filter);

    (0..HISTORY_MONTHS as i32)
        .rev()
        .map(|back| {
            let month = add_months(current_month, -back);
            let range = DateRange::month_of(month);
            let spent = compute_stats(filter_by_date_range(expenses, &range, Some(filter))).total;
            let scheduled = scheduled_installments_in_month(installments.iter().copied(), month);
            MonthlyTotal {
                month,
                label: month_label(month),
                expenses: spent,
                installments: scheduled,
                total: spent + scheduled,
            }
        })
        .collect()
}
