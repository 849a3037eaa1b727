use std::collections::HashMap;
use std::sync::RwLock;

use lotledger_catalog::Item;
use lotledger_core::{ItemId, TxnId};
use lotledger_ledger::{Transaction, TxnStatus};

use super::r#trait::{CommitOutcome, CommitRequest, LedgerStore, StoreError};

#[derive(Debug, Default)]
struct StoreInner {
    items: HashMap<ItemId, Item>,
    txns: Vec<Transaction>,
    txn_index: HashMap<TxnId, usize>,
    next_sequence: u64,
}

/// In-memory ledger store.
///
/// Intended for tests/dev and as the reference for the commit semantics a
/// persistent backend must provide. A single `RwLock` over all state makes
/// `commit` trivially atomic; validation happens entirely before the first
/// mutation so a failed commit leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::InvalidCommit("lock poisoned".to_string())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert_item(&self, item: Item) -> Result<Item, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        if inner.items.contains_key(&item.id) {
            return Err(StoreError::InvalidCommit(format!(
                "item id {} already exists",
                item.id
            )));
        }
        if inner.items.values().any(|i| i.sku == item.sku) {
            return Err(StoreError::InvalidCommit(format!(
                "sku '{}' already exists",
                item.sku
            )));
        }

        inner.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.items.get(&id).cloned())
    }

    fn find_item_by_sku(&self, sku: &str) -> Result<Option<Item>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.items.values().find(|i| i.sku == sku).cloned())
    }

    fn update_item(&self, mut item: Item) -> Result<Item, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        let current = inner
            .items
            .get(&item.id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item.id)))?;
        if current.version != item.version {
            return Err(StoreError::Conflict(format!(
                "item {} expected version {}, found {}",
                item.id, item.version, current.version
            )));
        }

        item.version += 1;
        inner.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        inner
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("item {id}")))
    }

    fn get_txn(&self, id: TxnId) -> Result<Option<Transaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .txn_index
            .get(&id)
            .map(|&idx| inner.txns[idx].clone()))
    }

    fn txns_for_item(&self, item_id: ItemId) -> Result<Vec<Transaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .txns
            .iter()
            .filter(|t| t.touches_item(item_id))
            .cloned()
            .collect())
    }

    fn commit(&self, req: CommitRequest) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        if inner.txn_index.contains_key(&req.txn.id) {
            return Err(StoreError::InvalidCommit(format!(
                "transaction {} already committed",
                req.txn.id
            )));
        }

        // Validate everything before mutating anything (all-or-nothing).
        for item in &req.items {
            let current = inner
                .items
                .get(&item.id)
                .ok_or_else(|| StoreError::NotFound(format!("item {}", item.id)))?;
            if current.version != item.version {
                return Err(StoreError::Conflict(format!(
                    "item {} expected version {}, found {}",
                    item.id, item.version, current.version
                )));
            }
        }

        if let Some(update) = &req.mark_reversed {
            let idx = *inner
                .txn_index
                .get(&update.original)
                .ok_or_else(|| StoreError::NotFound(format!("transaction {}", update.original)))?;
            // Re-check under the write lock: a competing reversal may have
            // landed since the caller loaded the original.
            if inner.txns[idx].is_reversed() {
                return Err(StoreError::AlreadyReversed(update.original));
            }
        }

        // Mutate.
        inner.next_sequence += 1;
        let mut txn = req.txn;
        txn.sequence = inner.next_sequence;

        let mut committed_items = Vec::with_capacity(req.items.len());
        for mut item in req.items {
            item.version += 1;
            inner.items.insert(item.id, item.clone());
            committed_items.push(item);
        }

        if let Some(update) = req.mark_reversed {
            let idx = inner.txn_index[&update.original];
            inner.txns[idx].status = TxnStatus::Reversed;
            inner.txns[idx].reversal = Some(update.marker);
        }

        let idx = inner.txns.len();
        inner.txns.push(txn.clone());
        inner.txn_index.insert(txn.id, idx);

        Ok(CommitOutcome {
            txn,
            items: committed_items,
        })
    }
}
