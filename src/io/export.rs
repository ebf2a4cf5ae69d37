use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{AppError, FinanceService};
use crate::domain::{
    format_cents, CategoryBudget, Expense, FamilyMember, Installment, Salary, Scope, ScopeFilter,
};

/// Everything visible to the session user, for a full JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub expenses: Vec<Expense>,
    pub installments: Vec<Installment>,
    pub salaries: Vec<Salary>,
    pub budgets: Vec<CategoryBudget>,
    pub family_members: Vec<FamilyMember>,
}

/// Exporter for writing expense data to various formats
pub struct Exporter<'a> {
    service: &'a FinanceService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a FinanceService) -> Self {
        Self { service }
    }

    /// Export one scope's expenses to CSV format
    pub async fn export_expenses_csv<W: Write>(&self, scope: Scope, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses(scope, None).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "description",
            "amount",
            "category",
            "payment_method",
            "scope",
            "notes",
        ])?;

        for expense in &expenses {
            csv_writer.write_record([
                expense.id.to_string(),
                expense.date.format("%Y-%m-%d").to_string(),
                expense.description.clone(),
                format_cents(expense.amount_cents),
                expense.category.to_string(),
                expense.payment_method.as_str().to_string(),
                expense.scope.as_str().to_string(),
                expense.notes.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(expenses.len())
    }

    /// Export one scope's installment plans to CSV format. Open-ended plans
    /// leave `count`, `total` and `remaining` empty.
    pub async fn export_installments_csv<W: Write>(
        &self,
        scope: Scope,
        writer: W,
    ) -> Result<usize> {
        let installments = self.service.list_installments(scope).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "description",
            "installment_amount",
            "count",
            "total",
            "paid",
            "remaining",
            "category",
            "payment_method",
            "start_date",
            "due_day",
            "scope",
        ])?;

        for installment in &installments {
            let optional = |value: Option<String>| value.unwrap_or_default();
            csv_writer.write_record([
                installment.id.to_string(),
                installment.description.clone(),
                format_cents(installment.installment_amount_cents),
                optional(installment.count().map(|count| count.to_string())),
                optional(installment.total_amount().map(format_cents)),
                installment.paid_count().to_string(),
                optional(installment.remaining_amount().map(format_cents)),
                installment.category.to_string(),
                installment.payment_method.as_str().to_string(),
                installment.start_date.format("%Y-%m-%d").to_string(),
                installment.due_day.to_string(),
                installment.scope.as_str().to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(installments.len())
    }

    /// Export every record the session may see as a JSON snapshot. Scopes
    /// the session has no access to are left out.
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<ExportSnapshot> {
        let snapshot = self.service.snapshot().await?;
        let filters: Vec<ScopeFilter> = [Scope::Personal, Scope::Family]
            .into_iter()
            .filter_map(|scope| self.service.scope_filter(scope).ok())
            .collect();

        let family_members = match self.service.list_family_members().await {
            Ok(members) => members,
            Err(AppError::FamilyAccessDenied) => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let export = ExportSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            expenses: snapshot
                .expenses
                .into_iter()
                .filter(|expense| filters.iter().any(|filter| filter.matches(expense)))
                .collect(),
            installments: snapshot
                .installments
                .into_iter()
                .filter(|installment| filters.iter().any(|filter| filter.matches(installment)))
                .collect(),
            salaries: snapshot
                .salaries
                .into_iter()
                .filter(|salary| filters.iter().any(|filter| filter.matches(salary)))
                .collect(),
            budgets: snapshot
                .budgets
                .into_iter()
                .filter(|budget| filters.iter().any(|filter| filter.matches(budget)))
                .collect(),
            family_members,
        };

        let json = serde_json::to_string_pretty(&export)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(export)
    }
}
