use thiserror::Error;

use crate::domain::CategoryError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("Installment not found: {0}")]
    InstallmentNotFound(String),

    #[error("Budget not found for category: {0}")]
    BudgetNotFound(String),

    #[error("Family member not found: {0}")]
    FamilyMemberNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(#[from] CategoryError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid installment count: {0}")]
    InvalidInstallmentCount(u32),

    #[error("Invalid due day {0}: must be between 1 and 31")]
    InvalidDueDay(u32),

    #[error("No current user: personal records need a signed-in user")]
    MissingUser,

    #[error("This user has no access to family records")]
    FamilyAccessDenied,

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
