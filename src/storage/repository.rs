use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Category, CategoryBudget, CategoryList, DateRange, Expense, ExpenseId, FamilyMember,
    FamilyMemberId, Installment, InstallmentId, InstallmentTerm, PaymentMethod, Salary, Scope,
    ScopeFilter, UserId,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_HOUSEHOLD};

const DATE_FORMAT: &str = "%Y-%m-%d";

const EXPENSE_COLUMNS: &str =
    "id, description, amount_cents, category, scope, payment_method, date, created_at, notes, owner_id";

const INSTALLMENT_COLUMNS: &str = "id, description, term, installment_count, total_amount_cents, installment_amount_cents, category, scope, payment_method, start_date, due_day, paid_installments, recurring, notes, owner_id, created_at";

/// SQLite-backed store for every record the engine reads. It only persists
/// and loads; all aggregation happens in the domain layer.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_HOUSEHOLD)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Expenses
    // ========================

    pub async fn save_expense(&self, expense: &Expense) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expenses (id, description, amount_cents, category, scope, payment_method, date, created_at, notes, owner_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expense.id.to_string())
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.category.as_str())
        .bind(expense.scope.as_str())
        .bind(expense.payment_method.as_str())
        .bind(expense.date.format(DATE_FORMAT).to_string())
        .bind(expense.created_at.to_rfc3339())
        .bind(&expense.notes)
        .bind(expense.owner.map(|id| id.to_string()))
        .execute(&self.pool)
        .await
        .context("Failed to save expense")?;
        Ok(())
    }

    /// Overwrite the mutable fields of an existing expense.
    pub async fn update_expense(&self, expense: &Expense) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE expenses
            SET description = ?, amount_cents = ?, category = ?, payment_method = ?, date = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.category.as_str())
        .bind(expense.payment_method.as_str())
        .bind(expense.date.format(DATE_FORMAT).to_string())
        .bind(&expense.notes)
        .bind(expense.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update expense")?;
        Ok(())
    }

    /// Delete an expense. Returns false if it did not exist.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete expense")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>> {
        let query = format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch expense")?;

        row.as_ref().map(Self::row_to_expense).transpose()
    }

    /// List expenses ordered by date, optionally limited to a date range
    /// (inclusive on both ends).
    pub async fn list_expenses(&self, range: Option<&DateRange>) -> Result<Vec<Expense>> {
        let rows = match range {
            Some(range) => {
                let query = format!(
                    "SELECT {} FROM expenses WHERE date >= ? AND date <= ? ORDER BY date, created_at",
                    EXPENSE_COLUMNS
                );
                sqlx::query(&query)
                    .bind(range.start.format(DATE_FORMAT).to_string())
                    .bind(range.end.format(DATE_FORMAT).to_string())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {} FROM expenses ORDER BY date, created_at",
                    EXPENSE_COLUMNS
                );
                sqlx::query(&query).fetch_all(&self.pool).await
            }
        }
        .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let id_str: String = row.get("id");
        let category: String = row.get("category");
        let scope_str: String = row.get("scope");
        let method_str: String = row.get("payment_method");
        let date_str: String = row.get("date");
        let created_at_str: String = row.get("created_at");
        let owner_str: Option<String> = row.get("owner_id");

        Ok(Expense {
            id: Uuid::parse_str(&id_str).context("Invalid expense ID")?,
            description: row.get("description"),
            amount_cents: row.get("amount_cents"),
            category: Category::new(&category),
            scope: parse_scope(&scope_str)?,
            payment_method: parse_payment_method(&method_str)?,
            date: parse_date(&date_str)?,
            created_at: parse_timestamp(&created_at_str)?,
            notes: row.get("notes"),
            owner: parse_owner(owner_str.as_deref())?,
        })
    }

    // ========================
    // Installments
    // ========================

    pub async fn save_installment(&self, installment: &Installment) -> Result<()> {
        let (term, count, total) = term_columns(&installment.term);
        let paid_json = serde_json::to_string(&installment.paid_installments)?;

        sqlx::query(
            r#"
            INSERT INTO installments (id, description, term, installment_count, total_amount_cents, installment_amount_cents, category, scope, payment_method, start_date, due_day, paid_installments, recurring, notes, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(installment.id.to_string())
        .bind(&installment.description)
        .bind(term)
        .bind(count)
        .bind(total)
        .bind(installment.installment_amount_cents)
        .bind(installment.category.as_str())
        .bind(installment.scope.as_str())
        .bind(installment.payment_method.as_str())
        .bind(installment.start_date.format(DATE_FORMAT).to_string())
        .bind(i64::from(installment.due_day))
        .bind(&paid_json)
        .bind(installment.recurring)
        .bind(&installment.notes)
        .bind(installment.owner.map(|id| id.to_string()))
        .bind(installment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save installment")?;
        Ok(())
    }

    /// Overwrite the mutable fields of an existing plan, including the paid set.
    pub async fn update_installment(&self, installment: &Installment) -> Result<()> {
        let paid_json = serde_json::to_string(&installment.paid_installments)?;

        sqlx::query(
            r#"
            UPDATE installments
            SET description = ?, category = ?, payment_method = ?, start_date = ?, due_day = ?,
                paid_installments = ?, recurring = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(&installment.description)
        .bind(installment.category.as_str())
        .bind(installment.payment_method.as_str())
        .bind(installment.start_date.format(DATE_FORMAT).to_string())
        .bind(i64::from(installment.due_day))
        .bind(&paid_json)
        .bind(installment.recurring)
        .bind(&installment.notes)
        .bind(installment.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update installment")?;
        Ok(())
    }

    pub async fn delete_installment(&self, id: InstallmentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM installments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete installment")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>> {
        let query = format!(
            "SELECT {} FROM installments WHERE id = ?",
            INSTALLMENT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch installment")?;

        row.as_ref().map(Self::row_to_installment).transpose()
    }

    pub async fn list_installments(&self) -> Result<Vec<Installment>> {
        let query = format!(
            "SELECT {} FROM installments ORDER BY start_date, created_at",
            INSTALLMENT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list installments")?;

        rows.iter().map(Self::row_to_installment).collect()
    }

    fn row_to_installment(row: &sqlx::sqlite::SqliteRow) -> Result<Installment> {
        let id_str: String = row.get("id");
        let term_str: String = row.get("term");
        let count: Option<i64> = row.get("installment_count");
        let total: Option<i64> = row.get("total_amount_cents");
        let category: String = row.get("category");
        let scope_str: String = row.get("scope");
        let method_str: String = row.get("payment_method");
        let start_str: String = row.get("start_date");
        let due_day: i64 = row.get("due_day");
        let paid_json: String = row.get("paid_installments");
        let owner_str: Option<String> = row.get("owner_id");
        let created_at_str: String = row.get("created_at");

        let term = match (term_str.as_str(), count, total) {
            ("fixed", Some(count), Some(total_amount_cents)) => InstallmentTerm::Fixed {
                count: u32::try_from(count).context("Invalid installment count")?,
                total_amount_cents,
            },
            ("indefinite", _, _) => InstallmentTerm::Indefinite,
            _ => anyhow::bail!("Invalid installment term: {}", term_str),
        };

        let paid_installments: BTreeSet<u32> =
            serde_json::from_str(&paid_json).context("Invalid paid installments")?;

        Ok(Installment {
            id: Uuid::parse_str(&id_str).context("Invalid installment ID")?,
            description: row.get("description"),
            term,
            installment_amount_cents: row.get("installment_amount_cents"),
            category: Category::new(&category),
            scope: parse_scope(&scope_str)?,
            payment_method: parse_payment_method(&method_str)?,
            start_date: parse_date(&start_str)?,
            due_day: u32::try_from(due_day).context("Invalid due day")?,
            paid_installments,
            recurring: row.get::<i32, _>("recurring") != 0,
            notes: row.get("notes"),
            owner: parse_owner(owner_str.as_deref())?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Salaries
    // ========================

    /// Insert or replace the salary for the record's `(scope, owner)`.
    pub async fn upsert_salary(&self, salary: &Salary) -> Result<()> {
        let filter = ScopeFilter {
            scope: salary.scope,
            owner: salary.owner,
        };
        sqlx::query(
            r#"
            INSERT INTO salaries (scope, owner_key, amount_cents, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (scope, owner_key)
            DO UPDATE SET amount_cents = excluded.amount_cents, updated_at = excluded.updated_at
            "#,
        )
        .bind(salary.scope.as_str())
        .bind(filter.owner_key())
        .bind(salary.amount_cents)
        .bind(salary.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save salary")?;
        Ok(())
    }

    pub async fn list_salaries(&self) -> Result<Vec<Salary>> {
        let rows = sqlx::query("SELECT scope, owner_key, amount_cents, updated_at FROM salaries")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list salaries")?;

        rows.iter()
            .map(|row| {
                let scope_str: String = row.get("scope");
                let owner_key: String = row.get("owner_key");
                let updated_at_str: String = row.get("updated_at");
                Ok(Salary {
                    amount_cents: row.get("amount_cents"),
                    scope: parse_scope(&scope_str)?,
                    owner: parse_owner(Some(owner_key.as_str()))?,
                    updated_at: parse_timestamp(&updated_at_str)?,
                })
            })
            .collect()
    }

    // ========================
    // Budgets
    // ========================

    /// Insert a budget, or replace the limit of the existing budget with the
    /// same `(category, scope, owner)`. Returns the stored budget.
    pub async fn upsert_budget(&self, budget: &CategoryBudget) -> Result<CategoryBudget> {
        let filter = ScopeFilter {
            scope: budget.scope,
            owner: budget.owner,
        };
        sqlx::query(
            r#"
            INSERT INTO budgets (id, category, monthly_limit_cents, scope, owner_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (category, scope, owner_key)
            DO UPDATE SET monthly_limit_cents = excluded.monthly_limit_cents
            "#,
        )
        .bind(budget.id.to_string())
        .bind(budget.category.as_str())
        .bind(budget.monthly_limit_cents)
        .bind(budget.scope.as_str())
        .bind(filter.owner_key())
        .bind(budget.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save budget")?;

        let row = sqlx::query(
            r#"
            SELECT id, category, monthly_limit_cents, scope, owner_key, created_at
            FROM budgets
            WHERE category = ? AND scope = ? AND owner_key = ?
            "#,
        )
        .bind(budget.category.as_str())
        .bind(budget.scope.as_str())
        .bind(filter.owner_key())
        .fetch_one(&self.pool)
        .await
        .context("Failed to reload budget")?;

        Self::row_to_budget(&row)
    }

    pub async fn delete_budget(&self, category: &Category, filter: &ScopeFilter) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM budgets WHERE category = ? AND scope = ? AND owner_key = ?")
                .bind(category.as_str())
                .bind(filter.scope.as_str())
                .bind(filter.owner_key())
                .execute(&self.pool)
                .await
                .context("Failed to delete budget")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_budgets(&self) -> Result<Vec<CategoryBudget>> {
        let rows = sqlx::query(
            "SELECT id, category, monthly_limit_cents, scope, owner_key, created_at FROM budgets ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list budgets")?;

        rows.iter().map(Self::row_to_budget).collect()
    }

    fn row_to_budget(row: &sqlx::sqlite::SqliteRow) -> Result<CategoryBudget> {
        let id_str: String = row.get("id");
        let category: String = row.get("category");
        let scope_str: String = row.get("scope");
        let owner_key: String = row.get("owner_key");
        let created_at_str: String = row.get("created_at");

        Ok(CategoryBudget {
            id: Uuid::parse_str(&id_str).context("Invalid budget ID")?,
            category: Category::new(&category),
            monthly_limit_cents: row.get("monthly_limit_cents"),
            scope: parse_scope(&scope_str)?,
            owner: parse_owner(Some(owner_key.as_str()))?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Family members
    // ========================

    pub async fn save_family_member(&self, member: &FamilyMember) -> Result<()> {
        sqlx::query(
            "INSERT INTO family_members (id, name, monthly_salary_cents, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(member.id.to_string())
        .bind(&member.name)
        .bind(member.monthly_salary_cents)
        .bind(member.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save family member")?;
        Ok(())
    }

    pub async fn delete_family_member(&self, id: FamilyMemberId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM family_members WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete family member")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_family_members(&self) -> Result<Vec<FamilyMember>> {
        let rows = sqlx::query(
            "SELECT id, name, monthly_salary_cents, created_at FROM family_members ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list family members")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let created_at_str: String = row.get("created_at");
                Ok(FamilyMember {
                    id: Uuid::parse_str(&id_str).context("Invalid family member ID")?,
                    name: row.get("name"),
                    monthly_salary_cents: row.get("monthly_salary_cents"),
                    created_at: parse_timestamp(&created_at_str)?,
                })
            })
            .collect()
    }

    // ========================
    // Categories
    // ========================

    /// Load a user's category list. `None` means the user never saved one.
    pub async fn load_categories(&self, user: UserId) -> Result<Option<CategoryList>> {
        let rows = sqlx::query("SELECT key FROM categories WHERE user_key = ? ORDER BY position")
            .bind(user.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to load categories")?;

        if rows.is_empty() {
            return Ok(None);
        }

        let categories = rows
            .iter()
            .map(|row| Category::new(row.get::<String, _>("key").as_str()))
            .collect();
        Ok(Some(CategoryList::from_keys(categories)))
    }

    /// Replace a user's category list, keeping its order.
    pub async fn save_categories(&self, user: UserId, categories: &CategoryList) -> Result<()> {
        let user_key = user.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM categories WHERE user_key = ?")
            .bind(&user_key)
            .execute(&mut *tx)
            .await
            .context("Failed to clear categories")?;

        for (position, category) in categories.iter().enumerate() {
            sqlx::query("INSERT INTO categories (user_key, position, key) VALUES (?, ?, ?)")
                .bind(&user_key)
                .bind(position as i64)
                .bind(category.as_str())
                .execute(&mut *tx)
                .await
                .context("Failed to save category")?;
        }

        tx.commit().await.context("Failed to commit categories")?;
        Ok(())
    }
}

fn term_columns(term: &InstallmentTerm) -> (&'static str, Option<i64>, Option<i64>) {
    match term {
        InstallmentTerm::Fixed {
            count,
            total_amount_cents,
        } => ("fixed", Some(i64::from(*count)), Some(*total_amount_cents)),
        InstallmentTerm::Indefinite => ("indefinite", None, None),
    }
}

fn parse_scope(s: &str) -> Result<Scope> {
    Scope::from_str(s).ok_or_else(|| anyhow::anyhow!("Invalid scope: {}", s))
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
    PaymentMethod::from_str(s).ok_or_else(|| anyhow::anyhow!("Invalid payment method: {}", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("Invalid date: {}", s))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

fn parse_owner(s: Option<&str>) -> Result<Option<UserId>> {
    match s {
        None | Some("") => Ok(None),
        Some(id) => Ok(Some(Uuid::parse_str(id).context("Invalid owner ID")?)),
    }
}
