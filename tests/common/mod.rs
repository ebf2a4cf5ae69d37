// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use gastos::application::{FinanceService, NewExpense, NewInstallment, Session};
use gastos::domain::{Category, Cents, Expense, FixedClock, Installment, PaymentMethod, Scope};
use tempfile::TempDir;
use uuid::Uuid;

/// "Today" for every service built by these helpers
pub const TODAY: &str = "2024-03-20";

/// Helper to create a test service with a temporary database, a signed-in
/// user with family access and a clock fixed at [`TODAY`].
pub async fn test_service() -> Result<(FinanceService, TempDir)> {
    test_service_with(Session::new(Some(Uuid::new_v4()), true)).await
}

/// Same as [`test_service`] with an explicit session.
pub async fn test_service_with(session: Session) -> Result<(FinanceService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = FinanceService::init(db_path.to_str().unwrap(), session)
        .await?
        .with_clock(Arc::new(FixedClock(parse_date(TODAY))));
    Ok((service, temp_dir))
}

/// A second service over the same database file, as another user would see it.
pub async fn reconnect(temp_dir: &TempDir, session: Session) -> Result<FinanceService> {
    let db_path = temp_dir.path().join("test.db");
    let service = FinanceService::connect(db_path.to_str().unwrap(), session)
        .await?
        .with_clock(Arc::new(FixedClock(parse_date(TODAY))));
    Ok(service)
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Input for a plain expense paid by pix
pub fn new_expense(scope: Scope, amount: Cents, category: &str, date: &str) -> NewExpense {
    NewExpense {
        description: format!("{} purchase", category),
        amount_cents: amount,
        category: Category::new(category),
        payment_method: PaymentMethod::Pix,
        date: parse_date(date),
        scope,
        notes: None,
    }
}

/// Record a plain expense and return it
pub async fn spend(
    service: &FinanceService,
    scope: Scope,
    amount: Cents,
    category: &str,
    date: &str,
) -> Result<Expense> {
    Ok(service
        .add_expense(new_expense(scope, amount, category, date))
        .await?)
}

/// Input for a credit card installment plan. `count: None` is open-ended.
pub fn new_installment(
    scope: Scope,
    amount: Cents,
    count: Option<u32>,
    category: &str,
    start_date: &str,
    due_day: u32,
) -> NewInstallment {
    NewInstallment {
        description: format!("{} plan", category),
        amount_cents: amount,
        count,
        category: Category::new(category),
        payment_method: PaymentMethod::CreditCard,
        start_date: parse_date(start_date),
        due_day,
        scope,
        recurring: false,
        notes: None,
    }
}

/// Record an installment plan and return it
pub async fn finance(
    service: &FinanceService,
    scope: Scope,
    amount: Cents,
    count: Option<u32>,
    category: &str,
    start_date: &str,
) -> Result<Installment> {
    let due_day = parse_date(start_date).day();
    Ok(service
        .add_installment(new_installment(
            scope, amount, count, category, start_date, due_day,
        ))
        .await?)
}
