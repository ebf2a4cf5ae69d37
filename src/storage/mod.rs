mod repository;

pub use repository::*;

/// SQL migration for expenses and installment plans
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for salaries, budgets, family members and categories
pub const MIGRATION_002_HOUSEHOLD: &str = include_str!("migrations/002_household.sql");
