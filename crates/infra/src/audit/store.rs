use std::sync::{Arc, RwLock};

use lotledger_core::ItemId;
use lotledger_ledger::ChemicalAudit;

use crate::ledger_store::StoreError;

/// Append-only store for denormalized chemical audit entries.
///
/// Deliberately decoupled from `LedgerStore`: audit mirroring is best-effort
/// and eventually consistent, never part of the authoritative commit.
pub trait AuditStore: Send + Sync {
    fn append(&self, entry: ChemicalAudit) -> Result<(), StoreError>;

    /// Entries for one item, in the order they were appended.
    fn for_item(&self, item_id: ItemId) -> Result<Vec<ChemicalAudit>, StoreError>;

    fn all(&self) -> Result<Vec<ChemicalAudit>, StoreError>;
}

impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    fn append(&self, entry: ChemicalAudit) -> Result<(), StoreError> {
        (**self).append(entry)
    }

    fn for_item(&self, item_id: ItemId) -> Result<Vec<ChemicalAudit>, StoreError> {
        (**self).for_item(item_id)
    }

    fn all(&self) -> Result<Vec<ChemicalAudit>, StoreError> {
        (**self).all()
    }
}

/// In-memory audit store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<ChemicalAudit>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::InvalidCommit("lock poisoned".to_string())
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, entry: ChemicalAudit) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.push(entry);
        Ok(())
    }

    fn for_item(&self, item_id: ItemId) -> Result<Vec<ChemicalAudit>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<ChemicalAudit>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.clone())
    }
}
