use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{
    active_salary, family_salary_total, filter_by_date_range, filter_by_scope, BudgetUsage,
    Category, CategoryBudget, CategoryList, Cents, Clock, DateRange, Expense, ExpenseId,
    ExpenseUpdate, FamilyMember, FamilyMemberId, Insight, Installment, InstallmentId,
    InstallmentSummary, InstallmentUpdate, MonthlyTotal, PaymentMethod, Salary, Scope,
    ScopeFilter, Scoped, Share, SystemClock, UserId,
};
use crate::storage::Repository;

use super::{AppError, ChangeNotifier, Dashboard, LedgerEvent, Snapshot, StatsReport};

/// Who is using the service. Built once at startup and passed in; the
/// service never looks up identity on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<UserId>,
    /// Whether this user may read and write family records
    pub family_access: bool,
}

impl Session {
    pub fn new(user_id: Option<UserId>, family_access: bool) -> Self {
        Self {
            user_id,
            family_access,
        }
    }
}

/// Input for a new expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount_cents: Cents,
    pub category: Category,
    pub payment_method: PaymentMethod,
    pub date: NaiveDate,
    pub scope: Scope,
    pub notes: Option<String>,
}

/// Input for a new installment plan. With a `count`, `amount_cents` is the
/// total split over that many months; without one the plan is open-ended
/// and `amount_cents` is charged every month.
#[derive(Debug, Clone)]
pub struct NewInstallment {
    pub description: String,
    pub amount_cents: Cents,
    pub count: Option<u32>,
    pub category: Category,
    pub payment_method: PaymentMethod,
    pub start_date: NaiveDate,
    pub due_day: u32,
    pub scope: Scope,
    pub recurring: bool,
    pub notes: Option<String>,
}

/// Result of toggling one installment's paid flag
pub struct PaymentToggle {
    pub installment: Installment,
    pub number: u32,
    pub paid: bool,
}

/// Application service providing high-level operations over expenses,
/// installments and household settings. This is the primary interface for
/// any client (CLI, API, TUI, etc.).
pub struct FinanceService {
    repo: Repository,
    session: Session,
    clock: Arc<dyn Clock>,
    notifier: ChangeNotifier,
}

impl FinanceService {
    /// Create a new service with the given repository and session.
    pub fn new(repo: Repository, session: Session) -> Self {
        Self {
            repo,
            session,
            clock: Arc::new(SystemClock),
            notifier: ChangeNotifier::default(),
        }
    }

    /// Replace the clock used to derive "today" and the current month.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, session: Session) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "database initialized");
        Ok(Self::new(repo, session))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, session: Session) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn current_month(&self) -> DateRange {
        DateRange::month_of(self.today())
    }

    /// Receive a [`LedgerEvent`] for every successful change.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.notifier.subscribe()
    }

    /// The filter for `scope` on behalf of the session user.
    pub fn scope_filter(&self, scope: Scope) -> Result<ScopeFilter, AppError> {
        match scope {
            Scope::Personal => {
                let user = self.session.user_id.ok_or(AppError::MissingUser)?;
                Ok(ScopeFilter::personal(Some(user)))
            }
            Scope::Family => {
                if !self.session.family_access {
                    return Err(AppError::FamilyAccessDenied);
                }
                Ok(ScopeFilter::family())
            }
        }
    }

    /// Check the session may see `record`. Records outside the session's
    /// view are reported as missing.
    fn visible<T: Scoped>(&self, record: &T) -> bool {
        self.scope_filter(record.scope())
            .map(|filter| filter.matches(record))
            .unwrap_or(false)
    }

    // ========================
    // Expense operations
    // ========================

    /// Record a new expense.
    pub async fn add_expense(&self, input: NewExpense) -> Result<Expense, AppError> {
        if input.amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }
        let filter = self.scope_filter(input.scope)?;

        let mut expense = Expense::new(
            input.description,
            input.amount_cents,
            input.category,
            input.payment_method,
            input.date,
        );
        if let (Scope::Personal, Some(owner)) = (filter.scope, filter.owner) {
            expense = expense.personal(owner);
        }
        if let Some(notes) = input.notes {
            expense = expense.with_notes(notes);
        }

        self.repo.save_expense(&expense).await?;
        info!(id = %expense.id, scope = %expense.scope, amount = expense.amount_cents, "expense added");
        self.notifier.publish(LedgerEvent::ExpenseAdded {
            id: expense.id,
            scope: expense.scope,
        });
        Ok(expense)
    }

    /// Get an expense visible to the session user.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Expense, AppError> {
        self.repo
            .get_expense(id)
            .await?
            .filter(|expense| self.visible(expense))
            .ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))
    }

    /// Apply a partial update to an expense.
    pub async fn update_expense(
        &self,
        id: ExpenseId,
        update: ExpenseUpdate,
    ) -> Result<Expense, AppError> {
        if update.amount_cents.is_some_and(|amount| amount <= 0) {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        let mut expense = self.get_expense(id).await?;
        expense.apply(update);
        self.repo.update_expense(&expense).await?;

        info!(id = %expense.id, "expense updated");
        self.notifier.publish(LedgerEvent::ExpenseUpdated {
            id: expense.id,
            scope: expense.scope,
        });
        Ok(expense)
    }

    /// Delete an expense, returning what was removed.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<Expense, AppError> {
        let expense = self.get_expense(id).await?;
        self.repo.delete_expense(id).await?;

        info!(id = %id, "expense deleted");
        self.notifier.publish(LedgerEvent::ExpenseDeleted { id });
        Ok(expense)
    }

    /// List expenses for a scope, optionally within a date range.
    pub async fn list_expenses(
        &self,
        scope: Scope,
        range: Option<DateRange>,
    ) -> Result<Vec<Expense>, AppError> {
        let filter = self.scope_filter(scope)?;
        let expenses = self.repo.list_expenses(range.as_ref()).await?;
        let visible: Vec<Expense> = match range {
            Some(range) => filter_by_date_range(&expenses, &range, Some(&filter))
                .into_iter()
                .cloned()
                .collect(),
            None => filter_by_scope(&expenses, &filter)
                .into_iter()
                .cloned()
                .collect(),
        };
        debug!(scope = %scope, count = visible.len(), "listed expenses");
        Ok(visible)
    }

    // ========================
    // Installment operations
    // ========================

    /// Record a new installment plan.
    pub async fn add_installment(&self, input: NewInstallment) -> Result<Installment, AppError> {
        if input.amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }
        if !(1..=31).contains(&input.due_day) {
            return Err(AppError::InvalidDueDay(input.due_day));
        }
        let filter = self.scope_filter(input.scope)?;

        let mut installment = match input.count {
            Some(0) => return Err(AppError::InvalidInstallmentCount(0)),
            Some(count) if input.amount_cents < i64::from(count) => {
                return Err(AppError::InvalidAmount(format!(
                    "Total is too small to split into {} installments",
                    count
                )));
            }
            Some(count) => Installment::fixed(
                input.description,
                input.amount_cents,
                count,
                input.category,
                input.payment_method,
                input.start_date,
                input.due_day,
            ),
            None => Installment::indefinite(
                input.description,
                input.amount_cents,
                input.category,
                input.payment_method,
                input.start_date,
                input.due_day,
            ),
        }
        .with_recurring(input.recurring);

        installment = match (filter.scope, self.session.user_id) {
            (Scope::Personal, Some(owner)) => installment.personal(owner),
            (Scope::Family, Some(creator)) => installment.with_owner(creator),
            _ => installment,
        };
        if let Some(notes) = input.notes {
            installment = installment.with_notes(notes);
        }

        self.repo.save_installment(&installment).await?;
        info!(
            id = %installment.id,
            scope = %installment.scope,
            amount = installment.installment_amount_cents,
            indefinite = installment.is_indefinite(),
            "installment added"
        );
        self.notifier.publish(LedgerEvent::InstallmentAdded {
            id: installment.id,
            scope: installment.scope,
        });
        Ok(installment)
    }

    /// Get an installment plan visible to the session user.
    pub async fn get_installment(&self, id: InstallmentId) -> Result<Installment, AppError> {
        self.repo
            .get_installment(id)
            .await?
            .filter(|installment| self.visible(installment))
            .ok_or_else(|| AppError::InstallmentNotFound(id.to_string()))
    }

    /// Apply a partial update to an installment plan.
    pub async fn update_installment(
        &self,
        id: InstallmentId,
        update: InstallmentUpdate,
    ) -> Result<Installment, AppError> {
        if let Some(due_day) = update.due_day {
            if !(1..=31).contains(&due_day) {
                return Err(AppError::InvalidDueDay(due_day));
            }
        }

        let mut installment = self.get_installment(id).await?;
        installment.apply(update);
        self.repo.update_installment(&installment).await?;

        info!(id = %installment.id, "installment updated");
        self.notifier.publish(LedgerEvent::InstallmentUpdated {
            id: installment.id,
            scope: installment.scope,
        });
        Ok(installment)
    }

    /// Flip the paid flag of installment `number`.
    pub async fn toggle_installment_paid(
        &self,
        id: InstallmentId,
        number: u32,
    ) -> Result<PaymentToggle, AppError> {
        let mut installment = self.get_installment(id).await?;
        if installment.count().is_some_and(|count| number == 0 || number > count) {
            warn!(id = %id, number, "toggling an installment number outside the plan");
        }

        let paid = installment.toggle_paid(number);
        self.repo.update_installment(&installment).await?;

        info!(id = %id, number, paid, "installment payment toggled");
        self.notifier.publish(LedgerEvent::InstallmentUpdated {
            id,
            scope: installment.scope,
        });
        Ok(PaymentToggle {
            installment,
            number,
            paid,
        })
    }

    /// Delete an installment plan, returning what was removed.
    pub async fn delete_installment(&self, id: InstallmentId) -> Result<Installment, AppError> {
        let installment = self.get_installment(id).await?;
        self.repo.delete_installment(id).await?;

        info!(id = %id, "installment deleted");
        self.notifier.publish(LedgerEvent::InstallmentDeleted { id });
        Ok(installment)
    }

    pub async fn list_installments(&self, scope: Scope) -> Result<Vec<Installment>, AppError> {
        let filter = self.scope_filter(scope)?;
        let installments = self.repo.list_installments().await?;
        Ok(filter_by_scope(&installments, &filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Amortization summaries (progress, remaining, next due date) for a scope.
    pub async fn installment_summaries(
        &self,
        scope: Scope,
    ) -> Result<Vec<InstallmentSummary>, AppError> {
        let filter = self.scope_filter(scope)?;
        let snapshot = self.snapshot().await?;
        Ok(snapshot.installment_summaries(&filter, self.today()))
    }

    /// Per-category installment totals for the distribution chart.
    pub async fn installment_distribution(
        &self,
        scope: Scope,
    ) -> Result<Vec<Share<Category>>, AppError> {
        let filter = self.scope_filter(scope)?;
        let snapshot = self.snapshot().await?;
        Ok(snapshot.installment_distribution(&filter))
    }

    // ========================
    // Salary and family members
    // ========================

    /// Set the monthly salary for a scope, replacing any previous value.
    pub async fn set_salary(&self, scope: Scope, amount_cents: Cents) -> Result<Salary, AppError> {
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Salary cannot be negative".to_string(),
            ));
        }
        let filter = self.scope_filter(scope)?;
        let salary = Salary::new(amount_cents, filter);
        self.repo.upsert_salary(&salary).await?;

        info!(scope = %scope, amount = amount_cents, "salary set");
        self.notifier.publish(LedgerEvent::SalaryChanged { scope });
        Ok(salary)
    }

    pub async fn get_salary(&self, scope: Scope) -> Result<Option<Salary>, AppError> {
        let filter = self.scope_filter(scope)?;
        let salaries = self.repo.list_salaries().await?;
        Ok(active_salary(&salaries, &filter).cloned())
    }

    pub async fn add_family_member(
        &self,
        name: String,
        monthly_salary_cents: Cents,
    ) -> Result<FamilyMember, AppError> {
        self.scope_filter(Scope::Family)?;
        if monthly_salary_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Salary cannot be negative".to_string(),
            ));
        }

        let member = FamilyMember::new(name, monthly_salary_cents);
        self.repo.save_family_member(&member).await?;

        info!(id = %member.id, name = %member.name, "family member added");
        self.notifier
            .publish(LedgerEvent::FamilyMembersChanged { id: member.id });
        Ok(member)
    }

    pub async fn list_family_members(&self) -> Result<Vec<FamilyMember>, AppError> {
        self.scope_filter(Scope::Family)?;
        Ok(self.repo.list_family_members().await?)
    }

    pub async fn remove_family_member(&self, id: FamilyMemberId) -> Result<(), AppError> {
        self.scope_filter(Scope::Family)?;
        if !self.repo.delete_family_member(id).await? {
            return Err(AppError::FamilyMemberNotFound(id.to_string()));
        }

        info!(id = %id, "family member removed");
        self.notifier
            .publish(LedgerEvent::FamilyMembersChanged { id });
        Ok(())
    }

    /// Sum of every family member's monthly contribution.
    pub async fn family_salary_total(&self) -> Result<Cents, AppError> {
        let members = self.list_family_members().await?;
        Ok(family_salary_total(&members))
    }

    // ========================
    // Budget operations
    // ========================

    /// Set the monthly limit for a category, replacing any existing limit
    /// for the same category and scope.
    pub async fn set_budget(
        &self,
        scope: Scope,
        category: Category,
        monthly_limit_cents: Cents,
    ) -> Result<CategoryBudget, AppError> {
        if monthly_limit_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Budget limit cannot be negative".to_string(),
            ));
        }
        let filter = self.scope_filter(scope)?;
        let budget = self
            .repo
            .upsert_budget(&CategoryBudget::new(category, monthly_limit_cents, filter))
            .await?;

        info!(category = %budget.category, scope = %scope, limit = monthly_limit_cents, "budget set");
        self.notifier.publish(LedgerEvent::BudgetChanged {
            category: budget.category.clone(),
            scope,
        });
        Ok(budget)
    }

    pub async fn delete_budget(&self, scope: Scope, category: &Category) -> Result<(), AppError> {
        let filter = self.scope_filter(scope)?;
        if !self.repo.delete_budget(category, &filter).await? {
            return Err(AppError::BudgetNotFound(category.to_string()));
        }

        info!(category = %category, scope = %scope, "budget deleted");
        self.notifier.publish(LedgerEvent::BudgetChanged {
            category: category.clone(),
            scope,
        });
        Ok(())
    }

    pub async fn list_budgets(&self, scope: Scope) -> Result<Vec<CategoryBudget>, AppError> {
        let filter = self.scope_filter(scope)?;
        let budgets = self.repo.list_budgets().await?;
        Ok(filter_by_scope(&budgets, &filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Spending against each budget of a scope (defaults to the current month).
    pub async fn budget_usages(
        &self,
        scope: Scope,
        range: Option<DateRange>,
    ) -> Result<Vec<BudgetUsage>, AppError> {
        let filter = self.scope_filter(scope)?;
        let range = range.unwrap_or_else(|| self.current_month());
        let snapshot = self.snapshot().await?;
        Ok(snapshot.budget_usages(&filter, &range))
    }

    // ========================
    // Categories
    // ========================

    /// The session user's category list, seeded with the defaults on first use.
    pub async fn categories(&self) -> Result<CategoryList, AppError> {
        let user = self.session.user_id.ok_or(AppError::MissingUser)?;
        match self.repo.load_categories(user).await? {
            Some(list) => Ok(list),
            None => {
                let list = CategoryList::default();
                self.repo.save_categories(user, &list).await?;
                debug!(user = %user, "seeded default categories");
                Ok(list)
            }
        }
    }

    pub async fn add_category(&self, name: &str) -> Result<Category, AppError> {
        let user = self.session.user_id.ok_or(AppError::MissingUser)?;
        let mut list = self.categories().await?;
        let category = list.add(name)?;
        self.repo.save_categories(user, &list).await?;

        info!(category = %category, "category added");
        self.notifier.publish(LedgerEvent::CategoriesChanged);
        Ok(category)
    }

    /// Remove a category from the list. Expenses tagged with it keep the key.
    pub async fn remove_category(&self, name: &str) -> Result<Category, AppError> {
        let user = self.session.user_id.ok_or(AppError::MissingUser)?;
        let category = Category::new(name);
        let mut list = self.categories().await?;
        if !list.remove(&category) {
            return Err(AppError::CategoryNotFound(category.to_string()));
        }
        self.repo.save_categories(user, &list).await?;

        info!(category = %category, "category removed");
        self.notifier.publish(LedgerEvent::CategoriesChanged);
        Ok(category)
    }

    // ========================
    // Read models
    // ========================

    /// Load every record into an immutable snapshot for the engine.
    pub async fn snapshot(&self) -> Result<Snapshot, AppError> {
        let snapshot = Snapshot {
            expenses: self.repo.list_expenses(None).await?,
            installments: self.repo.list_installments().await?,
            salaries: self.repo.list_salaries().await?,
            budgets: self.repo.list_budgets().await?,
            family_members: self.repo.list_family_members().await?,
        };
        debug!(
            expenses = snapshot.expenses.len(),
            installments = snapshot.installments.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Totals and breakdowns for a scope (defaults to the current month).
    pub async fn stats(
        &self,
        scope: Scope,
        range: Option<DateRange>,
    ) -> Result<StatsReport, AppError> {
        let filter = self.scope_filter(scope)?;
        let range = range.unwrap_or_else(|| self.current_month());
        let snapshot = self.snapshot().await?;
        Ok(snapshot.stats_report(&filter, &range))
    }

    pub async fn insights(
        &self,
        scope: Scope,
        range: Option<DateRange>,
    ) -> Result<Vec<Insight>, AppError> {
        let filter = self.scope_filter(scope)?;
        let range = range.unwrap_or_else(|| self.current_month());
        let snapshot = self.snapshot().await?;
        let insights = snapshot.insights(&filter, &range);
        debug!(scope = %scope, range = %range, count = insights.len(), "evaluated insights");
        Ok(insights)
    }

    /// The six-month history ending with the current month.
    pub async fn history(&self, scope: Scope) -> Result<Vec<MonthlyTotal>, AppError> {
        let filter = self.scope_filter(scope)?;
        let snapshot = self.snapshot().await?;
        Ok(snapshot.history(&filter, self.today()))
    }

    pub async fn dashboard(
        &self,
        scope: Scope,
        range: Option<DateRange>,
    ) -> Result<Dashboard, AppError> {
        let filter = self.scope_filter(scope)?;
        let range = range.unwrap_or_else(|| self.current_month());
        let snapshot = self.snapshot().await?;
        Ok(snapshot.dashboard(&filter, &range, self.today()))
    }
}
