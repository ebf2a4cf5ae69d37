mod common;

use anyhow::Result;
use common::{finance, parse_date, spend, test_service};
use gastos::application::AppError;
use gastos::domain::{
    BudgetStatus, Category, DateRange, InsightKind, PaymentMethod, Scope, Severity,
};

#[tokio::test]
async fn test_stats_default_to_current_month() -> Result<()> {
    let (service, _temp) = test_service().await?;

    spend(&service, Scope::Family, 30000, "alimentacao", "2024-03-01").await?;
    spend(&service, Scope::Family, 10000, "lazer", "2024-03-19").await?;
    spend(&service, Scope::Family, 20000, "alimentacao", "2024-03-31").await?;
    spend(&service, Scope::Family, 99999, "moradia", "2024-02-28").await?;

    let report = service.stats(Scope::Family, None).await?;
    assert_eq!(report.range, DateRange::month_of(parse_date("2024-03-01")));
    assert_eq!(report.stats.total, 60000);
    assert_eq!(report.stats.count, 3);
    assert_eq!(report.stats.average(), 20000);
    assert_eq!(report.stats.category_total(&Category::new("alimentacao")), 50000);
    assert_eq!(report.stats.by_payment_method.get(&PaymentMethod::Pix), Some(&60000));

    assert_eq!(report.categories[0].key, Category::new("alimentacao"));
    assert!((report.categories[0].percentage - 50000.0 / 60000.0 * 100.0).abs() < 1e-9);
    assert_eq!(report.categories[1].key, Category::new("lazer"));

    let february = DateRange::month_of(parse_date("2024-02-01"));
    let report = service.stats(Scope::Family, Some(february)).await?;
    assert_eq!(report.stats.total, 99999);

    Ok(())
}

#[tokio::test]
async fn test_stats_for_empty_period() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let report = service.stats(Scope::Family, None).await?;
    assert_eq!(report.stats.total, 0);
    assert_eq!(report.stats.count, 0);
    assert_eq!(report.stats.average(), 0);
    assert!(report.categories.is_empty());
    assert!(service.insights(Scope::Family, None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_budget_usage_statuses() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .set_budget(Scope::Family, Category::new("alimentacao"), 50000)
        .await?;
    service
        .set_budget(Scope::Family, Category::new("lazer"), 10000)
        .await?;
    service
        .set_budget(Scope::Family, Category::new("transporte"), 20000)
        .await?;

    spend(&service, Scope::Family, 45000, "alimentacao", "2024-03-05").await?;
    spend(&service, Scope::Family, 12000, "lazer", "2024-03-06").await?;
    spend(&service, Scope::Family, 5000, "transporte", "2024-03-07").await?;

    let mut usages = service.budget_usages(Scope::Family, None).await?;
    usages.sort_by(|a, b| a.category.cmp(&b.category));

    assert_eq!(usages[0].category, Category::new("alimentacao"));
    assert_eq!(usages[0].status, BudgetStatus::Warning);
    assert_eq!(usages[0].remaining, 5000);

    assert_eq!(usages[1].category, Category::new("lazer"));
    assert_eq!(usages[1].status, BudgetStatus::Exceeded);
    assert_eq!(usages[1].remaining, -2000);

    assert_eq!(usages[2].category, Category::new("transporte"));
    assert_eq!(usages[2].status, BudgetStatus::OnTrack);
    assert!((usages[2].percentage - 25.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_set_budget_replaces_existing_limit() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .set_budget(Scope::Family, Category::new("lazer"), 10000)
        .await?;
    service
        .set_budget(Scope::Family, Category::new("Lazer"), 15000)
        .await?;
    service
        .set_budget(Scope::Personal, Category::new("lazer"), 3000)
        .await?;

    let family = service.list_budgets(Scope::Family).await?;
    assert_eq!(family.len(), 1);
    assert_eq!(family[0].monthly_limit_cents, 15000);

    let personal = service.list_budgets(Scope::Personal).await?;
    assert_eq!(personal.len(), 1);
    assert_eq!(personal[0].monthly_limit_cents, 3000);

    service
        .delete_budget(Scope::Family, &Category::new("lazer"))
        .await?;
    assert!(service.list_budgets(Scope::Family).await?.is_empty());
    assert!(matches!(
        service
            .delete_budget(Scope::Family, &Category::new("lazer"))
            .await,
        Err(AppError::BudgetNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_insights_follow_rule_order() -> Result<()> {
    let (service, _temp) = test_service().await?;

    spend(&service, Scope::Family, 20000, "alimentacao", "2024-02-10").await?;

    spend(&service, Scope::Family, 30000, "alimentacao", "2024-03-02").await?;
    spend(&service, Scope::Family, 10000, "lazer", "2024-03-15").await?;
    service
        .set_budget(Scope::Family, Category::new("alimentacao"), 25000)
        .await?;
    service
        .set_budget(Scope::Family, Category::new("lazer"), 11000)
        .await?;

    let insights = service.insights(Scope::Family, None).await?;
    let severities: Vec<Severity> = insights.iter().map(|i| i.severity).collect();
    assert_eq!(severities.len(), 4);
    assert_eq!(severities[0], Severity::Warning);
    assert!(matches!(
        insights[0].kind,
        InsightKind::SpendingUp { percent } if (percent - 100.0).abs() < 1e-9
    ));

    // One entry per budget, then dominance last
    let budget_kinds: Vec<&InsightKind> = insights[1..3].iter().map(|i| &i.kind).collect();
    assert!(budget_kinds.iter().any(|kind| matches!(
        kind,
        InsightKind::BudgetExceeded { overage: 5000, .. }
    )));
    assert!(budget_kinds
        .iter()
        .any(|kind| matches!(kind, InsightKind::BudgetWarning { .. })));
    assert!(matches!(
        &insights[3].kind,
        InsightKind::CategoryDominance { category, .. } if category == &Category::new("alimentacao")
    ));

    Ok(())
}

#[tokio::test]
async fn test_spending_down_is_reported_as_success() -> Result<()> {
    let (service, _temp) = test_service().await?;

    spend(&service, Scope::Family, 10000, "alimentacao", "2024-02-10").await?;
    spend(&service, Scope::Family, 10000, "lazer", "2024-02-11").await?;
    spend(&service, Scope::Family, 3000, "alimentacao", "2024-03-10").await?;
    spend(&service, Scope::Family, 3000, "lazer", "2024-03-11").await?;
    spend(&service, Scope::Family, 3000, "transporte", "2024-03-12").await?;

    let insights = service.insights(Scope::Family, None).await?;
    // 9000 vs 20000 is a 55% drop; no category holds more than 40%
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].severity, Severity::Success);
    assert!(matches!(insights[0].kind, InsightKind::SpendingDown { .. }));

    Ok(())
}

#[tokio::test]
async fn test_history_covers_six_months() -> Result<()> {
    let (service, _temp) = test_service().await?;

    spend(&service, Scope::Family, 7000, "lazer", "2023-10-01").await?;
    spend(&service, Scope::Family, 5000, "lazer", "2023-09-30").await?;
    spend(&service, Scope::Family, 4000, "lazer", "2024-03-20").await?;
    let plan = finance(&service, Scope::Family, 30000, Some(3), "moradia", "2024-01-10").await?;
    // Paid installments still count as scheduled in history
    service.toggle_installment_paid(plan.id, 1).await?;

    let history = service.history(Scope::Family).await?;
    let labels: Vec<&str> = history.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["out/23", "nov/23", "dez/23", "jan/24", "fev/24", "mar/24"]);

    let totals: Vec<i64> = history.iter().map(|p| p.total).collect();
    assert_eq!(totals, vec![7000, 0, 0, 10000, 10000, 14000]);

    Ok(())
}

#[tokio::test]
async fn test_dashboard_combines_income_and_commitments() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.set_salary(Scope::Family, 300000).await?;
    service.add_family_member("Ana".to_string(), 200000).await?;

    spend(&service, Scope::Family, 40000, "alimentacao", "2024-03-04").await?;
    spend(&service, Scope::Family, 10000, "transporte", "2024-03-08").await?;
    // Outside the month
    spend(&service, Scope::Family, 25000, "transporte", "2024-04-01").await?;

    let plan = finance(&service, Scope::Family, 60000, Some(6), "moradia", "2024-01-05").await?;
    service.toggle_installment_paid(plan.id, 3).await?;
    finance(&service, Scope::Family, 5000, None, "lazer", "2024-03-10").await?;

    let dashboard = service.dashboard(Scope::Family, None).await?;
    assert_eq!(dashboard.income, 500000);
    assert_eq!(dashboard.stats.total, 50000);
    // March installment of the 6x plan is paid; only the monthly charge is due
    assert_eq!(dashboard.installments_due, 5000);
    assert_eq!(dashboard.committed, 55000);
    assert_eq!(dashboard.balance, 445000);
    assert!((dashboard.income_used_percent - 11.0).abs() < 1e-9);
    assert_eq!(dashboard.history.len(), 6);
    assert_eq!(dashboard.history[5].total, 50000 + 10000 + 5000);
    assert_eq!(dashboard.categories[0].key, Category::new("alimentacao"));

    Ok(())
}
