use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    active_salary, breakdown, build_history, compute_stats, evaluate_insights,
    family_salary_total, filter_by_date_range, filter_by_scope, installment_distribution,
    outstanding_total, percent_of, BudgetUsage, Category, CategoryBudget, Cents, DateRange,
    Expense, ExpenseStats, FamilyMember, Insight, Installment, InstallmentSummary, MonthlyTotal,
    PaymentMethod, Salary, Scope, ScopeFilter, Share,
};

/// Everything the engine reads, as plain in-memory collections. Built once
/// per request from the repository and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub expenses: Vec<Expense>,
    pub installments: Vec<Installment>,
    pub salaries: Vec<Salary>,
    pub budgets: Vec<CategoryBudget>,
    pub family_members: Vec<FamilyMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub scope: Scope,
    pub range: DateRange,
    pub stats: ExpenseStats,
    pub categories: Vec<Share<Category>>,
    pub payment_methods: Vec<Share<PaymentMethod>>,
}

/// The headline numbers for one scope and period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub scope: Scope,
    pub range: DateRange,
    pub stats: ExpenseStats,
    pub previous_stats: ExpenseStats,
    /// Unpaid installments falling inside the range
    pub installments_due: Cents,
    pub income: Cents,
    /// Expenses plus installments still due in the range
    pub committed: Cents,
    pub balance: Cents,
    pub income_used_percent: f64,
    pub categories: Vec<Share<Category>>,
    pub budgets: Vec<BudgetUsage>,
    pub insights: Vec<Insight>,
    pub history: Vec<MonthlyTotal>,
}

impl Snapshot {
    pub fn expenses_in(&self, filter: &ScopeFilter, range: &DateRange) -> Vec<&Expense> {
        filter_by_date_range(&self.expenses, range, Some(filter))
    }

    pub fn stats(&self, filter: &ScopeFilter, range: &DateRange) -> ExpenseStats {
        compute_stats(self.expenses_in(filter, range))
    }

    pub fn stats_report(&self, filter: &ScopeFilter, range: &DateRange) -> StatsReport {
        let stats = self.stats(filter, range);
        StatsReport {
            scope: filter.scope,
            range: *range,
            categories: breakdown(&stats.by_category),
            payment_methods: breakdown(&stats.by_payment_method),
            stats,
        }
    }

    /// Monthly income for a scope: the user's salary for personal, the
    /// family salary plus every family member's contribution for family.
    pub fn income(&self, filter: &ScopeFilter) -> Cents {
        let salary = active_salary(&self.salaries, filter)
            .map(|salary| salary.amount_cents)
            .unwrap_or(0);
        match filter.scope {
            Scope::Personal => salary,
            Scope::Family => salary + family_salary_total(&self.family_members),
        }
    }

    pub fn budgets_for(&self, filter: &ScopeFilter) -> Vec<&CategoryBudget> {
        filter_by_scope(&self.budgets, filter)
    }

    pub fn budget_usages(&self, filter: &ScopeFilter, range: &DateRange) -> Vec<BudgetUsage> {
        let stats = self.stats(filter, range);
        self.budgets_for(filter)
            .into_iter()
            .map(|budget| budget.usage(&stats))
            .collect()
    }

    /// Insights for `range`, compared with the same window one month back.
    pub fn insights(&self, filter: &ScopeFilter, range: &DateRange) -> Vec<Insight> {
        let current = self.stats(filter, range);
        let previous = self.stats(filter, &range.previous());
        evaluate_insights(&current, &previous, self.budgets_for(filter))
    }

    pub fn history(&self, filter: &ScopeFilter, today: NaiveDate) -> Vec<MonthlyTotal> {
        build_history(&self.expenses, &self.installments, filter, today)
    }

    pub fn installments_for(&self, filter: &ScopeFilter) -> Vec<&Installment> {
        filter_by_scope(&self.installments, filter)
    }

    pub fn installments_due(&self, filter: &ScopeFilter, range: &DateRange) -> Cents {
        outstanding_total(self.installments_for(filter), range)
    }

    pub fn installment_summaries(
        &self,
        filter: &ScopeFilter,
        today: NaiveDate,
    ) -> Vec<InstallmentSummary> {
        self.installments_for(filter)
            .into_iter()
            .map(|installment| installment.summary(today))
            .collect()
    }

    /// Per-category installment amounts for the distribution chart.
    pub fn installment_distribution(&self, filter: &ScopeFilter) -> Vec<Share<Category>> {
        breakdown(&installment_distribution(self.installments_for(filter)))
    }

    pub fn dashboard(&self, filter: &ScopeFilter, range: &DateRange, today: NaiveDate) -> Dashboard {
        let stats = self.stats(filter, range);
        let previous_stats = self.stats(filter, &range.previous());
        let budgets = self.budgets_for(filter);
        let insights = evaluate_insights(&stats, &previous_stats, budgets.iter().copied());
        let budget_usages = budgets.iter().map(|budget| budget.usage(&stats)).collect();

        let installments_due = self.installments_due(filter, range);
        let income = self.income(filter);
        let committed = stats.total + installments_due;

        Dashboard {
            scope: filter.scope,
            range: *range,
            categories: breakdown(&stats.by_category),
            previous_stats,
            installments_due,
            income,
            committed,
            balance: income - committed,
            income_used_percent: percent_of(committed, income),
            budgets: budget_usages,
            insights,
            history: self.history(filter, today),
            stats,
        }
    }
}
