use chrono::NaiveDate;

use super::{DateRange, Expense, ScopeFilter, Scoped};

/// Records that happen on a calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for Expense {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Records visible under `filter`: every family record for the family
/// scope, only the owner's personal records for the personal scope. A
/// personal filter with no owner yields nothing.
pub fn filter_by_scope<'a, T: Scoped>(all: &'a [T], filter: &ScopeFilter) -> Vec<&'a T> {
    all.iter().filter(|record| filter.matches(*record)).collect()
}

/// Records dated within `range` (both ends inclusive), optionally also
/// restricted to a scope.
pub fn filter_by_date_range<'a, T: Dated + Scoped>(
    all: &'a [T],
    range: &DateRange,
    filter: Option<&ScopeFilter>,
) -> Vec<&'a T> {
    all.iter()
        .filter(|record| range.contains(record.date()))
        .filter(|record| filter.is_none_or(|f| f.matches(*record)))
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::{Category, PaymentMethod};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn expense(on: &str) -> Expense {
        Expense::new(
            "gasto",
            1000,
            Category::new("outros"),
            PaymentMethod::Cash,
            date(on),
        )
    }

    #[test]
    fn test_scope_filtering() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let expenses = vec![
            expense("2024-01-01"),
            expense("2024-01-02").personal(me),
            expense("2024-01-03").personal(other),
        ];

        assert_eq!(filter_by_scope(&expenses, &ScopeFilter::family()).len(), 1);

        let mine = filter_by_scope(&expenses, &ScopeFilter::personal(Some(me)));
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner, Some(me));

        assert!(filter_by_scope(&expenses, &ScopeFilter::personal(None)).is_empty());
    }

    #[test]
    fn test_single_day_range() {
        let expenses = vec![
            expense("2024-01-09"),
            expense("2024-01-10"),
            expense("2024-01-10"),
            expense("2024-01-11"),
        ];
        let day = DateRange::day(date("2024-01-10"));

        let found = filter_by_date_range(&expenses, &day, None);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|e| e.date == date("2024-01-10")));
    }

    #[test]
    fn test_range_with_scope() {
        let me = Uuid::new_v4();
        let expenses = vec![
            expense("2024-01-05"),
            expense("2024-01-06").personal(me),
            expense("2024-02-06").personal(me),
        ];
        let january = DateRange::month_of(date("2024-01-20"));

        let mine = filter_by_date_range(&expenses, &january, Some(&ScopeFilter::personal(Some(me))));
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].date, date("2024-01-06"));

        assert_eq!(filter_by_date_range(&expenses, &january, None).len(), 2);
    }
}
