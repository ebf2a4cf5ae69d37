mod common;

use anyhow::Result;
use common::{finance, new_installment, parse_date, reconnect, test_service};
use gastos::application::AppError;
use gastos::domain::{Category, InstallmentUpdate, Scope};

#[tokio::test]
async fn test_fixed_plan_splits_total_evenly() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let plan = finance(&service, Scope::Family, 120000, Some(12), "moradia", "2024-01-10").await?;
    assert_eq!(plan.installment_amount_cents, 10000);
    assert_eq!(plan.count(), Some(12));
    assert_eq!(plan.total_amount(), Some(120000));

    // Rounds half-up to the cent
    let odd = finance(&service, Scope::Family, 10000, Some(3), "lazer", "2024-01-10").await?;
    assert_eq!(odd.installment_amount_cents, 3333);

    Ok(())
}

#[tokio::test]
async fn test_summary_tracks_payments() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let plan = finance(&service, Scope::Family, 120000, Some(12), "moradia", "2024-01-10").await?;

    let summaries = service.installment_summaries(Scope::Family).await?;
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.current_installment, 3);
    assert_eq!(summary.paid_count, 0);
    assert_eq!(summary.remaining, Some(120000));
    assert_eq!(summary.progress, Some(0.0));
    assert_eq!(summary.next_due_date, Some(parse_date("2024-01-10")));

    service.toggle_installment_paid(plan.id, 1).await?;
    service.toggle_installment_paid(plan.id, 2).await?;

    let summary = service.get_installment(plan.id).await?.summary(parse_date("2024-03-20"));
    assert_eq!(summary.paid_count, 2);
    assert_eq!(summary.paid_amount, 20000);
    assert_eq!(summary.remaining, Some(100000));
    assert!((summary.progress.unwrap() - 100.0 * 2.0 / 12.0).abs() < 1e-9);
    assert_eq!(summary.next_due_date, Some(parse_date("2024-03-10")));

    Ok(())
}

#[tokio::test]
async fn test_toggle_paid_is_symmetric_and_persisted() -> Result<()> {
    let (service, temp) = test_service().await?;
    let plan = finance(&service, Scope::Family, 30000, Some(3), "saude", "2024-02-05").await?;

    let first = service.toggle_installment_paid(plan.id, 2).await?;
    assert!(first.paid);
    assert!(first.installment.is_paid(2));

    let second = service.toggle_installment_paid(plan.id, 2).await?;
    assert!(!second.paid);
    assert!(second.installment.paid_installments.is_empty());

    service.toggle_installment_paid(plan.id, 3).await?;

    let reopened = reconnect(&temp, *service.session()).await?;
    let loaded = reopened.get_installment(plan.id).await?;
    assert_eq!(loaded.paid_installments.iter().copied().collect::<Vec<_>>(), vec![3]);

    Ok(())
}

#[tokio::test]
async fn test_indefinite_plan_has_no_total() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let streaming = finance(&service, Scope::Family, 5990, None, "lazer", "2024-01-15").await?;

    assert!(streaming.is_indefinite());
    assert_eq!(streaming.installment_amount_cents, 5990);

    service.toggle_installment_paid(streaming.id, 1).await?;
    let summary = service.installment_summaries(Scope::Family).await?.remove(0);
    assert_eq!(summary.count, None);
    assert_eq!(summary.total, None);
    assert_eq!(summary.remaining, None);
    assert_eq!(summary.progress, None);
    assert_eq!(summary.paid_amount, 5990);
    assert_eq!(summary.current_installment, 3);
    assert_eq!(summary.next_due_date, Some(parse_date("2024-02-15")));

    Ok(())
}

#[tokio::test]
async fn test_due_date_clamps_to_short_months() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let plan = finance(&service, Scope::Family, 90000, Some(3), "educacao", "2024-01-31").await?;

    service.toggle_installment_paid(plan.id, 1).await?;
    let plan = service.get_installment(plan.id).await?;
    assert_eq!(plan.next_due_date(), Some(parse_date("2024-02-29")));

    service.toggle_installment_paid(plan.id, 2).await?;
    service.toggle_installment_paid(plan.id, 3).await?;
    let plan = service.get_installment(plan.id).await?;
    assert_eq!(plan.next_due_date(), None);
    assert_eq!(plan.remaining_amount(), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_add_installment_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for due_day in [0, 32] {
        let result = service
            .add_installment(new_installment(
                Scope::Family,
                10000,
                Some(2),
                "outros",
                "2024-03-01",
                due_day,
            ))
            .await;
        assert!(matches!(result, Err(AppError::InvalidDueDay(day)) if day == due_day));
    }

    let zero_count = service
        .add_installment(new_installment(
            Scope::Family,
            10000,
            Some(0),
            "outros",
            "2024-03-01",
            1,
        ))
        .await;
    assert!(matches!(zero_count, Err(AppError::InvalidInstallmentCount(0))));

    let zero_amount = service
        .add_installment(new_installment(
            Scope::Family,
            0,
            None,
            "outros",
            "2024-03-01",
            1,
        ))
        .await;
    assert!(matches!(zero_amount, Err(AppError::InvalidAmount(_))));

    // Five cents cannot be split into twelve installments
    let too_small = service
        .add_installment(new_installment(
            Scope::Family,
            5,
            Some(12),
            "outros",
            "2024-03-01",
            1,
        ))
        .await;
    assert!(matches!(too_small, Err(AppError::InvalidAmount(_))));

    // One cent each is the smallest plan
    let smallest = service
        .add_installment(new_installment(
            Scope::Family,
            12,
            Some(12),
            "outros",
            "2024-03-01",
            1,
        ))
        .await?;
    assert_eq!(smallest.installment_amount_cents, 1);
    service.delete_installment(smallest.id).await?;

    assert!(service.list_installments(Scope::Family).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_update_and_delete_installment() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let plan = finance(&service, Scope::Family, 60000, Some(6), "outros", "2024-03-01").await?;

    let updated = service
        .update_installment(
            plan.id,
            InstallmentUpdate {
                description: Some("Geladeira".to_string()),
                category: Some(Category::new("moradia")),
                due_day: Some(25),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.description, "Geladeira");
    assert_eq!(updated.category, Category::new("moradia"));
    assert_eq!(updated.next_due_date(), Some(parse_date("2024-03-25")));
    assert_eq!(updated.installment_amount_cents, 10000);

    let invalid = service
        .update_installment(
            plan.id,
            InstallmentUpdate {
                due_day: Some(40),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(invalid, Err(AppError::InvalidDueDay(40))));

    service.delete_installment(plan.id).await?;
    assert!(matches!(
        service.get_installment(plan.id).await,
        Err(AppError::InstallmentNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_distribution_uses_remaining_and_paid_amounts() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let sofa = finance(&service, Scope::Family, 120000, Some(12), "moradia", "2024-01-10").await?;
    service.toggle_installment_paid(sofa.id, 1).await?;

    let streaming = finance(&service, Scope::Family, 5990, None, "lazer", "2024-01-15").await?;
    service.toggle_installment_paid(streaming.id, 1).await?;
    service.toggle_installment_paid(streaming.id, 2).await?;

    // Personal plans stay out of the family chart
    finance(&service, Scope::Personal, 50000, Some(5), "moradia", "2024-01-10").await?;

    let shares = service.installment_distribution(Scope::Family).await?;
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].key, Category::new("moradia"));
    assert_eq!(shares[0].amount, 110000);
    assert_eq!(shares[1].key, Category::new("lazer"));
    assert_eq!(shares[1].amount, 11980);

    let total = (110000 + 11980) as f64;
    assert!((shares[0].percentage - 110000.0 / total * 100.0).abs() < 1e-9);

    Ok(())
}
