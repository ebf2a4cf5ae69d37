use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    add_months, months_between, percent_of, split_evenly, with_clamped_day, Category, Cents,
    DateRange, PaymentMethod, Scope, Scoped, UserId,
};

pub type InstallmentId = Uuid;

/// How long an installment plan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InstallmentTerm {
    /// A purchase split into `count` equal payments.
    Fixed { count: u32, total_amount_cents: Cents },
    /// An open-ended monthly charge with no defined total.
    Indefinite,
}

/// A purchase paid in monthly installments.
///
/// Installment numbers are 1-based: step `i` (counted from the start date)
/// is installment number `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub description: String,
    pub term: InstallmentTerm,
    /// Amount charged each month, in cents
    pub installment_amount_cents: Cents,
    pub category: Category,
    pub scope: Scope,
    pub payment_method: PaymentMethod,
    pub start_date: NaiveDate,
    /// Day of the month the installment falls due (1-31, clamped to the month length)
    pub due_day: u32,
    /// Installment numbers marked as paid
    pub paid_installments: BTreeSet<u32>,
    pub recurring: bool,
    pub notes: Option<String>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Installment {
    /// A finite plan: `total_amount_cents` split over `count` months.
    pub fn fixed(
        description: impl Into<String>,
        total_amount_cents: Cents,
        count: u32,
        category: Category,
        payment_method: PaymentMethod,
        start_date: NaiveDate,
        due_day: u32,
    ) -> Self {
        assert!(total_amount_cents > 0, "Installment total must be positive");
        assert!(count > 0, "Installment count must be at least 1");
        assert!(
            total_amount_cents >= i64::from(count),
            "Installment total must be at least one cent per installment"
        );
        Self::build(
            description.into(),
            InstallmentTerm::Fixed {
                count,
                total_amount_cents,
            },
            split_evenly(total_amount_cents, count),
            category,
            payment_method,
            start_date,
            due_day,
        )
    }

    /// An open-ended plan charging `monthly_amount_cents` every month.
    pub fn indefinite(
        description: impl Into<String>,
        monthly_amount_cents: Cents,
        category: Category,
        payment_method: PaymentMethod,
        start_date: NaiveDate,
        due_day: u32,
    ) -> Self {
        assert!(monthly_amount_cents > 0, "Installment amount must be positive");
        Self::build(
            description.into(),
            InstallmentTerm::Indefinite,
            monthly_amount_cents,
            category,
            payment_method,
            start_date,
            due_day,
        )
    }

    fn build(
        description: String,
        term: InstallmentTerm,
        installment_amount_cents: Cents,
        category: Category,
        payment_method: PaymentMethod,
        start_date: NaiveDate,
        due_day: u32,
    ) -> Self {
        assert!((1..=31).contains(&due_day), "Due day must be between 1 and 31");
        Self {
            id: Uuid::new_v4(),
            description,
            term,
            installment_amount_cents,
            category,
            scope: Scope::Family,
            payment_method,
            start_date,
            due_day,
            paid_installments: BTreeSet::new(),
            recurring: false,
            notes: None,
            owner: None,
            created_at: Utc::now(),
        }
    }

    pub fn personal(mut self, owner: UserId) -> Self {
        self.scope = Scope::Personal;
        self.owner = Some(owner);
        self
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    pub fn with_paid(mut self, numbers: impl IntoIterator<Item = u32>) -> Self {
        self.paid_installments.extend(numbers);
        self
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self.term, InstallmentTerm::Indefinite)
    }

    /// Number of installments, or `None` for open-ended plans.
    pub fn count(&self) -> Option<u32> {
        match self.term {
            InstallmentTerm::Fixed { count, .. } => Some(count),
            InstallmentTerm::Indefinite => None,
        }
    }

    /// Total owed, or `None` ("indeterminate") for open-ended plans.
    pub fn total_amount(&self) -> Option<Cents> {
        match self.term {
            InstallmentTerm::Fixed {
                total_amount_cents, ..
            } => Some(total_amount_cents),
            InstallmentTerm::Indefinite => None,
        }
    }

    /// The synthetic date of step `step`: the start date moved forward by
    /// `step` months.
    pub fn step_date(&self, step: u32) -> NaiveDate {
        add_months(self.start_date, step as i32)
    }

    /// The due date of step `step`: its month with the day set to `due_day`.
    pub fn due_date(&self, step: u32) -> NaiveDate {
        with_clamped_day(self.step_date(step), self.due_day)
    }

    /// Installment numbers whose step date falls inside `range`, regardless
    /// of payment status. Stops at the end of the calendar for open-ended
    /// plans.
    pub fn numbers_in(&self, range: &DateRange) -> Vec<u32> {
        let mut numbers = Vec::new();
        let mut step = 0u32;
        loop {
            if let Some(count) = self.count() {
                if step >= count {
                    break;
                }
            }
            let Some(date) = self.start_date.checked_add_months(Months::new(step)) else {
                break;
            };
            if date > range.end {
                break;
            }
            if range.contains(date) {
                numbers.push(step + 1);
            }
            step += 1;
        }
        numbers
    }

    /// Amount still unpaid among the installments that fall inside `range`.
    pub fn outstanding_in(&self, range: &DateRange) -> Cents {
        self.numbers_in(range)
            .into_iter()
            .filter(|number| !self.is_paid(*number))
            .map(|_| self.installment_amount_cents)
            .sum()
    }

    /// Whether the plan is scheduled to charge in the month of `month`,
    /// independent of payment status.
    pub fn scheduled_in_month(&self, month: NaiveDate) -> bool {
        let diff = months_between(month, self.start_date);
        if diff < 0 {
            return false;
        }
        match self.count() {
            Some(count) => (diff as u32) < count,
            None => true,
        }
    }

    pub fn is_paid(&self, number: u32) -> bool {
        self.paid_installments.contains(&number)
    }

    /// Flip the paid state of installment `number`. Returns true if it is
    /// paid afterwards. Toggling twice restores the original set.
    pub fn toggle_paid(&mut self, number: u32) -> bool {
        if self.paid_installments.remove(&number) {
            false
        } else {
            self.paid_installments.insert(number);
            true
        }
    }

    pub fn paid_count(&self) -> u32 {
        self.paid_installments.len() as u32
    }

    pub fn paid_amount(&self) -> Cents {
        i64::from(self.paid_count()) * self.installment_amount_cents
    }

    /// Percentage of installments paid; `None` for open-ended plans.
    pub fn progress(&self) -> Option<f64> {
        self.count().map(|count| {
            percent_of(i64::from(self.paid_count()), i64::from(count)).min(100.0)
        })
    }

    /// Amount still owed on the whole plan; `None` for open-ended plans.
    /// Never negative, even if the paid set holds numbers past the count.
    pub fn remaining_amount(&self) -> Option<Cents> {
        self.count().map(|count| {
            i64::from(count.saturating_sub(self.paid_count())) * self.installment_amount_cents
        })
    }

    /// Due date of the step at index `paid_count`, or `None` once a finite
    /// plan is fully paid.
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        let next_step = self.paid_count();
        match self.count() {
            Some(count) if next_step >= count => None,
            _ => Some(self.due_date(next_step)),
        }
    }

    /// The installment number running on `on` (1-based), capped at the count.
    /// Zero before the plan starts.
    pub fn current_installment(&self, on: NaiveDate) -> u32 {
        let diff = months_between(on, self.start_date);
        if diff < 0 {
            return 0;
        }
        let number = diff as u32 + 1;
        match self.count() {
            Some(count) => number.min(count),
            None => number,
        }
    }

    /// Apply a partial update. Fields left as `None` keep their value.
    pub fn apply(&mut self, update: InstallmentUpdate) {
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(payment_method) = update.payment_method {
            self.payment_method = payment_method;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(due_day) = update.due_day {
            self.due_day = due_day;
        }
        if let Some(recurring) = update.recurring {
            self.recurring = recurring;
        }
        if let Some(notes) = update.notes {
            self.notes = if notes.is_empty() { None } else { Some(notes) };
        }
    }

    pub fn summary(&self, today: NaiveDate) -> InstallmentSummary {
        InstallmentSummary {
            id: self.id,
            description: self.description.clone(),
            category: self.category.clone(),
            installment_amount: self.installment_amount_cents,
            count: self.count(),
            current_installment: self.current_installment(today),
            total: self.total_amount(),
            paid_count: self.paid_count(),
            paid_amount: self.paid_amount(),
            remaining: self.remaining_amount(),
            progress: self.progress(),
            next_due_date: self.next_due_date(),
        }
    }
}

impl Scoped for Installment {
    fn scope(&self) -> Scope {
        self.scope
    }

    fn owner(&self) -> Option<UserId> {
        self.owner
    }
}

/// Partial update for an installment plan. An empty `notes` clears them.
#[derive(Debug, Clone, Default)]
pub struct InstallmentUpdate {
    pub description: Option<String>,
    pub category: Option<Category>,
    pub payment_method: Option<PaymentMethod>,
    pub start_date: Option<NaiveDate>,
    pub due_day: Option<u32>,
    pub recurring: Option<bool>,
    pub notes: Option<String>,
}

/// Amortization view of one installment plan. `None` totals mean the plan
/// is open-ended and its total is indeterminate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentSummary {
    pub id: InstallmentId,
    pub description: String,
    pub category: Category,
    pub installment_amount: Cents,
    pub count: Option<u32>,
    pub current_installment: u32,
    pub total: Option<Cents>,
    pub paid_count: u32,
    pub paid_amount: Cents,
    pub remaining: Option<Cents>,
    pub progress: Option<f64>,
    pub next_due_date: Option<NaiveDate>,
}

/// Sum of unpaid installments falling inside `range`.
pub fn outstanding_total<'a, I>(installments: I, range: &DateRange) -> Cents
where
    I: IntoIterator<Item = &'a Installment>,
{
    installments
        .into_iter()
        .map(|installment| installment.outstanding_in(range))
        .sum()
}

/// Per-category amounts for distribution charts: what is still owed on
/// finite plans, and what has been paid so far on open-ended ones.
pub fn installment_distribution<'a, I>(installments: I) -> BTreeMap<Category, Cents>
where
    I: IntoIterator<Item = &'a Installment>,
{
    let mut distribution = BTreeMap::new();
    for installment in installments {
        let amount = installment
            .remaining_amount()
            .unwrap_or_else(|| installment.paid_amount());
        *distribution
            .entry(installment.category.clone())
            .or_insert(0) += amount;
    }
    distribution
}
