use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Cents, Scope, Scoped, UserId};

pub type ExpenseId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[serde(rename = "dinheiro")]
    Cash,
    #[serde(rename = "debito")]
    DebitCard,
    #[serde(rename = "credito")]
    CreditCard,
    Pix,
    #[serde(rename = "transferencia")]
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::DebitCard,
        PaymentMethod::CreditCard,
        PaymentMethod::Pix,
        PaymentMethod::BankTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "dinheiro",
            PaymentMethod::DebitCard => "debito",
            PaymentMethod::CreditCard => "credito",
            PaymentMethod::Pix => "pix",
            PaymentMethod::BankTransfer => "transferencia",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dinheiro" | "cash" => Some(PaymentMethod::Cash),
            "debito" | "debit" => Some(PaymentMethod::DebitCard),
            "credito" | "credit" => Some(PaymentMethod::CreditCard),
            "pix" => Some(PaymentMethod::Pix),
            "transferencia" | "transfer" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::DebitCard => "Cartão de Débito",
            PaymentMethod::CreditCard => "Cartão de Crédito",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::BankTransfer => "Transferência",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single purchase, either personal or shared with the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub category: Category,
    pub scope: Scope,
    pub payment_method: PaymentMethod,
    /// Day the purchase happened
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
    /// Set for personal expenses; ignored for family ones
    pub owner: Option<UserId>,
}

impl Expense {
    pub fn new(
        description: impl Into<String>,
        amount_cents: Cents,
        category: Category,
        payment_method: PaymentMethod,
        date: NaiveDate,
    ) -> Self {
        assert!(amount_cents > 0, "Expense amount must be positive");
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount_cents,
            category,
            scope: Scope::Family,
            payment_method,
            date,
            created_at: Utc::now(),
            notes: None,
            owner: None,
        }
    }

    /// Make this a personal expense owned by `owner`.
    pub fn personal(mut self, owner: UserId) -> Self {
        self.scope = Scope::Personal;
        self.owner = Some(owner);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Apply a partial update. Fields left as `None` keep their value.
    pub fn apply(&mut self, update: ExpenseUpdate) {
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(amount_cents) = update.amount_cents {
            self.amount_cents = amount_cents;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(payment_method) = update.payment_method {
            self.payment_method = payment_method;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(notes) = update.notes {
            self.notes = if notes.is_empty() { None } else { Some(notes) };
        }
    }
}

impl Scoped for Expense {
    fn scope(&self) -> Scope {
        self.scope
    }

    fn owner(&self) -> Option<UserId> {
        self.owner
    }
}

/// Partial update for an expense. An empty `notes` string clears the notes.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount_cents: Option<Cents>,
    pub category: Option<Category>,
    pub payment_method: Option<PaymentMethod>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}
