use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar days. Time of day never takes part in
/// comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range covering a single day.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// The calendar month containing `date`, from the 1st to the last day.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = first_of_month(date);
        let end = add_months(start, 1)
            .pred_opt()
            .unwrap_or(start);
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Same-length window moved by `months` calendar months (negative moves
    /// back). Days that don't exist in the target month clamp to its last day.
    pub fn shift_months(&self, months: i32) -> Self {
        Self::new(add_months(self.start, months), add_months(self.end, months))
    }

    /// The previous comparison window: the same range one month earlier.
    pub fn previous(&self) -> Self {
        self.shift_months(-1)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Add (or subtract) calendar months, clamping to the end of the month
/// (Jan 31 + 1 month = Feb 29 on leap years).
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Calendar month difference `a - b`, ignoring days.
/// months_between(2024-03-31, 2024-01-01) == 2
pub fn months_between(a: NaiveDate, b: NaiveDate) -> i32 {
    (a.year() - b.year()) * 12 + a.month() as i32 - b.month() as i32
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let range = DateRange::month_of(date);
    range.end.day()
}

/// Move `date` to `day` within the same month, clamped to the month length.
pub fn with_clamped_day(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(date));
    date.with_day(day).unwrap_or(date)
}
