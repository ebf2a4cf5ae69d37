use chrono::{Local, NaiveDate};

/// Source of "today". The engine never reads the system clock directly; the
/// current month is always derived from an injected clock.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one day, for tests and reproducible reports.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
