use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Category, FamilyMemberId, Scope};

/// Capacity of the change channel; slow subscribers skip ahead instead of
/// blocking writers.
const CHANNEL_CAPACITY: usize = 64;

/// A change to the stored records. Subscribers re-read what they need and
/// recompute; events carry identifiers, not data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    ExpenseAdded { id: Uuid, scope: Scope },
    ExpenseUpdated { id: Uuid, scope: Scope },
    ExpenseDeleted { id: Uuid },
    InstallmentAdded { id: Uuid, scope: Scope },
    InstallmentUpdated { id: Uuid, scope: Scope },
    InstallmentDeleted { id: Uuid },
    SalaryChanged { scope: Scope },
    BudgetChanged { category: Category, scope: Scope },
    FamilyMembersChanged { id: FamilyMemberId },
    CategoriesChanged,
}

/// Fan-out of [`LedgerEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<LedgerEvent>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl ChangeNotifier {
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: LedgerEvent) {
        match self.sender.send(event) {
            Ok(receivers) => debug!(receivers, "published ledger event"),
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "no subscribers for ledger event")
            }
        }
    }
}
