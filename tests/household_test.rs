mod common;

use anyhow::Result;
use common::{finance, reconnect, spend, test_service, test_service_with};
use gastos::application::{AppError, Session};
use gastos::domain::{Category, CategoryError, Scope, DEFAULT_CATEGORIES};
use gastos::io::Exporter;
use uuid::Uuid;

#[tokio::test]
async fn test_salary_is_replaced_per_scope() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.get_salary(Scope::Personal).await?.is_none());

    service.set_salary(Scope::Personal, 450000).await?;
    service.set_salary(Scope::Personal, 480000).await?;
    service.set_salary(Scope::Family, 900000).await?;

    let personal = service.get_salary(Scope::Personal).await?.unwrap();
    assert_eq!(personal.amount_cents, 480000);
    assert_eq!(personal.owner, service.session().user_id);

    let family = service.get_salary(Scope::Family).await?.unwrap();
    assert_eq!(family.amount_cents, 900000);
    assert_eq!(family.owner, None);

    assert!(matches!(
        service.set_salary(Scope::Personal, -1).await,
        Err(AppError::InvalidAmount(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_salaries_are_kept_per_user() -> Result<()> {
    let (service, temp) = test_service().await?;
    service.set_salary(Scope::Personal, 450000).await?;

    let other = reconnect(&temp, Session::new(Some(Uuid::new_v4()), false)).await?;
    assert!(other.get_salary(Scope::Personal).await?.is_none());
    other.set_salary(Scope::Personal, 200000).await?;

    assert_eq!(
        service.get_salary(Scope::Personal).await?.unwrap().amount_cents,
        450000
    );

    Ok(())
}

#[tokio::test]
async fn test_family_members() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ana = service.add_family_member("Ana".to_string(), 350000).await?;
    service.add_family_member("Bruno".to_string(), 150000).await?;

    let members = service.list_family_members().await?;
    assert_eq!(members.len(), 2);
    assert_eq!(service.family_salary_total().await?, 500000);

    service.remove_family_member(ana.id).await?;
    assert_eq!(service.family_salary_total().await?, 150000);
    assert!(matches!(
        service.remove_family_member(ana.id).await,
        Err(AppError::FamilyMemberNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_categories_are_seeded_and_editable() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let categories = service.categories().await?;
    let keys: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
    assert_eq!(keys, DEFAULT_CATEGORIES.to_vec());

    let pets = service.add_category("Pets e Veterinário").await?;
    assert_eq!(pets.as_str(), "pets_e_veterinário");
    assert!(matches!(
        service.add_category("pets-e-veterinário").await,
        Err(AppError::InvalidCategory(CategoryError::Duplicate(_)))
    ));
    assert!(matches!(
        service.add_category("   ").await,
        Err(AppError::InvalidCategory(CategoryError::Empty))
    ));

    let categories = service.categories().await?;
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len() + 1);
    assert_eq!(categories.iter().last(), Some(&pets));

    Ok(())
}

#[tokio::test]
async fn test_removing_a_category_keeps_tagged_expenses() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let expense = spend(&service, Scope::Family, 8000, "vestuario", "2024-03-12").await?;
    service.remove_category("vestuario").await?;

    assert!(!service.categories().await?.contains(&Category::new("vestuario")));
    let loaded = service.get_expense(expense.id).await?;
    assert_eq!(loaded.category, Category::new("vestuario"));

    let report = service.stats(Scope::Family, None).await?;
    assert_eq!(report.categories[0].key, Category::new("vestuario"));

    assert!(matches!(
        service.remove_category("vestuario").await,
        Err(AppError::CategoryNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_scope_access_rules() -> Result<()> {
    let (anonymous, _temp) = test_service_with(Session::new(None, true)).await?;
    assert!(matches!(
        anonymous.list_expenses(Scope::Personal, None).await,
        Err(AppError::MissingUser)
    ));
    assert!(matches!(anonymous.categories().await, Err(AppError::MissingUser)));
    assert!(anonymous.list_expenses(Scope::Family, None).await?.is_empty());

    let (no_family, _temp) = test_service_with(Session::new(Some(Uuid::new_v4()), false)).await?;
    assert!(matches!(
        spend(&no_family, Scope::Family, 1000, "lazer", "2024-03-01")
            .await
            .unwrap_err()
            .downcast_ref::<AppError>(),
        Some(AppError::FamilyAccessDenied)
    ));
    assert!(matches!(
        no_family.dashboard(Scope::Family, None).await,
        Err(AppError::FamilyAccessDenied)
    ));
    assert!(matches!(
        no_family.list_family_members().await,
        Err(AppError::FamilyAccessDenied)
    ));
    assert!(no_family.list_expenses(Scope::Personal, None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_export_csv_and_json() -> Result<()> {
    let (service, _temp) = test_service().await?;

    spend(&service, Scope::Family, 4550, "alimentacao", "2024-03-02").await?;
    spend(&service, Scope::Family, 1200, "transporte", "2024-03-03").await?;
    spend(&service, Scope::Personal, 999, "lazer", "2024-03-04").await?;
    finance(&service, Scope::Family, 5990, None, "lazer", "2024-01-15").await?;

    let exporter = Exporter::new(&service);

    let mut csv = Vec::new();
    let count = exporter.export_expenses_csv(Scope::Family, &mut csv).await?;
    assert_eq!(count, 2);
    let csv = String::from_utf8(csv)?;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,date,description,amount,category,payment_method,scope,notes")
    );
    assert!(csv.contains("2024-03-02,alimentacao purchase,45.50,alimentacao,pix,family,"));
    assert!(!csv.contains("9.99"));

    let mut csv = Vec::new();
    exporter
        .export_installments_csv(Scope::Family, &mut csv)
        .await?;
    let csv = String::from_utf8(csv)?;
    // Open-ended plans leave count, total and remaining empty
    assert!(csv.contains("lazer plan,59.90,,,0,,lazer,credito,2024-01-15,15,family"));

    let mut json = Vec::new();
    let snapshot = exporter.export_full_json(&mut json).await?;
    assert_eq!(snapshot.expenses.len(), 3);
    assert_eq!(snapshot.installments.len(), 1);
    let parsed: serde_json::Value = serde_json::from_slice(&json)?;
    assert_eq!(parsed["expenses"].as_array().map(|a| a.len()), Some(3));

    Ok(())
}
