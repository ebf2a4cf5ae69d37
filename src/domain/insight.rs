use serde::{Deserialize, Serialize};

use super::{format_cents, percent_of, BudgetStatus, CategoryBudget, Category, Cents, ExpenseStats};

/// Period-over-period change (in percent) that counts as a trend.
pub const TREND_THRESHOLD_PERCENT: f64 = 10.0;

/// Share of total spending above which a single category is called out.
pub const DOMINANCE_THRESHOLD_PERCENT: f64 = 40.0;

/// Ordered from least to most severe. Insights are emitted in rule order,
/// never sorted by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an insight is about, with the numbers behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsightKind {
    SpendingUp { percent: f64 },
    SpendingDown { percent: f64 },
    BudgetExceeded { category: Category, overage: Cents },
    BudgetWarning { category: Category, percentage: f64 },
    CategoryDominance { category: Category, percentage: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub severity: Severity,
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
}

impl Insight {
    fn new(severity: Severity, kind: InsightKind, title: String, description: String) -> Self {
        Self {
            severity,
            kind,
            title,
            description,
        }
    }
}

/// Compare a period against the previous one and against its budgets.
///
/// Rules run in a fixed order and every match is emitted:
/// 1. trend: more than 10% up or down versus a non-empty previous period;
/// 2. one entry per budget above 80% of its limit (error above 100%);
/// 3. dominance: the top category holds more than 40% of the total.
pub fn evaluate_insights<'a, I>(
    current: &ExpenseStats,
    previous: &ExpenseStats,
    budgets: I,
) -> Vec<Insight>
where
    I: IntoIterator<Item = &'a CategoryBudget>,
{
    let mut insights = Vec::new();

    if let Some(insight) = trend_insight(current, previous) {
        insights.push(insight);
    }

    for budget in budgets {
        if let Some(insight) = budget_insight(budget, current) {
            insights.push(insight);
        }
    }

    if let Some(insight) = dominance_insight(current) {
        insights.push(insight);
    }

    insights
}

fn trend_insight(current: &ExpenseStats, previous: &ExpenseStats) -> Option<Insight> {
    if previous.total <= 0 {
        return None;
    }
    let change = percent_of(current.total - previous.total, previous.total);
    if change.abs() <= TREND_THRESHOLD_PERCENT {
        return None;
    }

    let percent = change.abs();
    Some(if change > 0.0 {
        Insight::new(
            Severity::Warning,
            InsightKind::SpendingUp { percent },
            "Spending increased".to_string(),
            format!(
                "You spent {:.1}% more than in the previous period.",
                percent
            ),
        )
    } else {
        Insight::new(
            Severity::Success,
            InsightKind::SpendingDown { percent },
            "Spending decreased".to_string(),
            format!(
                "You spent {:.1}% less than in the previous period.",
                percent
            ),
        )
    })
}

fn budget_insight(budget: &CategoryBudget, current: &ExpenseStats) -> Option<Insight> {
    let usage = budget.usage(current);
    let label = usage.category.label();
    match usage.status {
        BudgetStatus::Exceeded => {
            let overage = usage.spent - usage.limit;
            Some(Insight::new(
                Severity::Error,
                InsightKind::BudgetExceeded {
                    category: usage.category,
                    overage,
                },
                format!("Budget exceeded: {}", label),
                format!(
                    "You are {} over the monthly limit for {}.",
                    format_cents(overage),
                    label
                ),
            ))
        }
        BudgetStatus::Warning => Some(Insight::new(
            Severity::Warning,
            InsightKind::BudgetWarning {
                category: usage.category,
                percentage: usage.percentage,
            },
            format!("Budget almost used: {}", label),
            format!(
                "{:.1}% of the monthly limit for {} has been used.",
                usage.percentage, label
            ),
        )),
        BudgetStatus::OnTrack => None,
    }
}

fn dominance_insight(current: &ExpenseStats) -> Option<Insight> {
    let (category, amount) = current.top_category()?;
    let percentage = percent_of(amount, current.total);
    if percentage <= DOMINANCE_THRESHOLD_PERCENT {
        return None;
    }

    let label = category.label();
    Some(Insight::new(
        Severity::Info,
        InsightKind::CategoryDominance {
            category: category.clone(),
            percentage,
        },
        format!("{} leads your spending", label),
        format!(
            "{} accounts for {:.1}% of everything spent in this period.",
            label, percentage
        ),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{compute_stats, Expense, PaymentMethod, ScopeFilter};

    fn stats(items: &[(&str, Cents)]) -> ExpenseStats {
        let expenses: Vec<Expense> = items
            .iter()
            .map(|(category, amount)| {
                Expense::new(
                    "gasto",
                    *amount,
                    Category::new(category),
                    PaymentMethod::Pix,
                    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                )
            })
            .collect();
        compute_stats(&expenses)
    }

    fn no_budgets() -> Vec<CategoryBudget> {
        Vec::new()
    }

    fn budget(category: &str, limit: Cents) -> CategoryBudget {
        CategoryBudget::new(Category::new(category), limit, ScopeFilter::family())
    }

    #[test]
    fn test_no_trend_without_previous_spending() {
        let current = stats(&[("lazer", 100000)]);
        let previous = ExpenseStats::default();
        let insights = evaluate_insights(&current, &previous, &no_budgets());
        assert!(!insights
            .iter()
            .any(|i| matches!(i.kind, InsightKind::SpendingUp { .. } | InsightKind::SpendingDown { .. })));
    }

    #[test]
    fn test_trend_up_and_down() {
        let previous = stats(&[("lazer", 1000), ("moradia", 1000), ("saude", 1000)]);

        let up = stats(&[("lazer", 1200), ("moradia", 1000), ("saude", 1200)]);
        let insights = evaluate_insights(&up, &previous, &no_budgets());
        assert_eq!(insights[0].severity, Severity::Warning);
        match &insights[0].kind {
            InsightKind::SpendingUp { percent } => assert!((percent - 13.333).abs() < 0.01),
            other => panic!("unexpected insight: {:?}", other),
        }

        let down = stats(&[("lazer", 800), ("moradia", 1000), ("saude", 800)]);
        let insights = evaluate_insights(&down, &previous, &no_budgets());
        assert_eq!(insights[0].severity, Severity::Success);
    }

    #[test]
    fn test_small_change_is_not_a_trend() {
        let previous = stats(&[("lazer", 1000), ("moradia", 1000), ("saude", 1000)]);
        let current = stats(&[("lazer", 1100), ("moradia", 1000), ("saude", 1100)]);
        assert!(evaluate_insights(&current, &previous, &no_budgets()).is_empty());
    }

    #[test]
    fn test_budget_rules() {
        let current = stats(&[("lazer", 12000), ("saude", 8500), ("moradia", 1000), ("educacao", 9000)]);
        let budgets = vec![budget("lazer", 10000), budget("saude", 10000), budget("moradia", 10000)];

        let insights = evaluate_insights(&current, &ExpenseStats::default(), &budgets);
        assert_eq!(insights.len(), 2);

        assert_eq!(insights[0].severity, Severity::Error);
        assert_eq!(
            insights[0].kind,
            InsightKind::BudgetExceeded {
                category: Category::new("lazer"),
                overage: 2000
            }
        );
        assert_eq!(insights[1].severity, Severity::Warning);
        assert!(insights[1].description.contains("85.0%"));
    }

    #[test]
    fn test_zero_limit_budget_never_fires() {
        let current = stats(&[("lazer", 1000), ("saude", 1000), ("moradia", 1000)]);
        let insights = evaluate_insights(&current, &ExpenseStats::default(), &[budget("lazer", 0)]);
        assert!(insights.is_empty());
    }

    #[test]
    fn test_dominance_and_rule_order() {
        let previous = stats(&[("lazer", 1000)]);
        let current = stats(&[("moradia", 9000), ("lazer", 1000)]);
        let budgets = vec![budget("moradia", 8000)];

        let insights = evaluate_insights(&current, &previous, &budgets);
        let severities: Vec<Severity> = insights.iter().map(|i| i.severity).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error, Severity::Info]);

        match &insights[2].kind {
            InsightKind::CategoryDominance { category, percentage } => {
                assert_eq!(category, &Category::new("moradia"));
                assert!((percentage - 90.0).abs() < 1e-9);
            }
            other => panic!("unexpected insight: {:?}", other),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Success);
        assert!(Severity::Success > Severity::Info);
    }
}
