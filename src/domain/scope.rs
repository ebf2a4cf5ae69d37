use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Whether a record belongs to a single user or is shared by the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Personal,
    Family,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Personal => "personal",
            Scope::Family => "family",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "personal" | "pessoal" => Some(Scope::Personal),
            "family" | "familia" | "família" => Some(Scope::Family),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The scope discriminator every engine entry point takes: which scope to
/// look at, and on whose behalf when it is personal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    pub scope: Scope,
    pub owner: Option<UserId>,
}

impl ScopeFilter {
    pub fn personal(owner: Option<UserId>) -> Self {
        Self {
            scope: Scope::Personal,
            owner,
        }
    }

    pub fn family() -> Self {
        Self {
            scope: Scope::Family,
            owner: None,
        }
    }

    /// Family records match on scope alone; personal records must also be
    /// owned by the filter's owner. A personal filter without an owner
    /// matches nothing.
    pub fn matches<T: Scoped + ?Sized>(&self, record: &T) -> bool {
        if record.scope() != self.scope {
            return false;
        }
        match self.scope {
            Scope::Family => true,
            Scope::Personal => match (self.owner, record.owner()) {
                (Some(current), Some(owner)) => current == owner,
                _ => false,
            },
        }
    }

    /// Storage key for the owner column: family rows have no owner.
    pub fn owner_key(&self) -> String {
        match self.scope {
            Scope::Family => String::new(),
            Scope::Personal => self.owner.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

/// Records that carry a scope and an optional owner.
pub trait Scoped {
    fn scope(&self) -> Scope;
    fn owner(&self) -> Option<UserId>;
}
