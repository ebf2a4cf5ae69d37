use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Scope, ScopeFilter, Scoped, UserId};

pub type FamilyMemberId = Uuid;

/// Monthly income for a scope. There is at most one active salary per
/// `(scope, owner)`; setting it again replaces the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    pub amount_cents: Cents,
    pub scope: Scope,
    pub owner: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}

impl Salary {
    pub fn new(amount_cents: Cents, filter: ScopeFilter) -> Self {
        Self {
            amount_cents,
            scope: filter.scope,
            owner: match filter.scope {
                Scope::Personal => filter.owner,
                Scope::Family => None,
            },
            updated_at: Utc::now(),
        }
    }
}

impl Scoped for Salary {
    fn scope(&self) -> Scope {
        self.scope
    }

    fn owner(&self) -> Option<UserId> {
        self.owner
    }
}

/// The active salary for `filter`: the most recently written match wins.
pub fn active_salary<'a, I>(salaries: I, filter: &ScopeFilter) -> Option<&'a Salary>
where
    I: IntoIterator<Item = &'a Salary>,
{
    salaries
        .into_iter()
        .filter(|salary| filter.matches(*salary))
        .max_by_key(|salary| salary.updated_at)
}

/// A household member contributing to the family income. Independent of
/// any user's own salary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: FamilyMemberId,
    pub name: String,
    pub monthly_salary_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl FamilyMember {
    pub fn new(name: impl Into<String>, monthly_salary_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            monthly_salary_cents,
            created_at: Utc::now(),
        }
    }
}

pub fn family_salary_total(members: &[FamilyMember]) -> Cents {
    members.iter().map(|m| m.monthly_salary_cents).sum()
}
