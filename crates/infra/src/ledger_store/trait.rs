use std::sync::Arc;

use thiserror::Error;

use lotledger_catalog::Item;
use lotledger_core::{ItemId, TxnId};
use lotledger_ledger::{ReversalMarker, Transaction};

/// Ledger store operation error.
///
/// Infrastructure-level failures (concurrency, missing records, malformed
/// commits) as opposed to domain validation, which never reaches the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed (stale item version).
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// A referenced record is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The transaction named by a reversal update already carries a marker.
    #[error("transaction {0} is already reversed")]
    AlreadyReversed(TxnId),

    /// Invalid commit payload or internal storage failure.
    #[error("invalid commit: {0}")]
    InvalidCommit(String),
}

/// Marker update applied atomically with a reversing transaction's commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalUpdate {
    pub original: TxnId,
    pub marker: ReversalMarker,
}

/// The atomic unit of a posting: every touched item in its new state, the
/// transaction to append, and (for reversals) the marker for the original.
///
/// Each item's `version` must be the version the writer loaded; the store
/// compares it against current state and rejects the whole commit on any
/// mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub txn: Transaction,
    pub items: Vec<Item>,
    pub mark_reversed: Option<ReversalUpdate>,
}

/// Result of a successful commit: the transaction with its assigned global
/// sequence, and the items with their bumped versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub txn: Transaction,
    pub items: Vec<Item>,
}

/// Item catalog + append-only transaction log behind one commit boundary.
///
/// Implementations must:
/// - apply `commit` all-or-nothing: item mutations, the transaction append,
///   and any reversal marker either all happen or none do
/// - enforce optimistic concurrency on every item in the commit
/// - re-check the reversal marker under the same critical section (two
///   concurrent reversals of one transaction cannot both succeed)
/// - assign `sequence` monotonically (no gaps observed by readers, no reuse)
/// - keep committed transactions immutable apart from the reversal marker
pub trait LedgerStore: Send + Sync {
    /// Insert a new catalog item. Fails with `InvalidCommit` when the id or
    /// SKU is already taken.
    fn insert_item(&self, item: Item) -> Result<Item, StoreError>;

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    fn find_item_by_sku(&self, sku: &str) -> Result<Option<Item>, StoreError>;

    /// Replace an item's non-quantity state (catalog maintenance: lot
    /// add/remove, renames). Optimistic: the submitted `version` must match
    /// the stored one. Quantity changes go through `commit`.
    fn update_item(&self, item: Item) -> Result<Item, StoreError>;

    fn delete_item(&self, id: ItemId) -> Result<(), StoreError>;

    fn get_txn(&self, id: TxnId) -> Result<Option<Transaction>, StoreError>;

    /// All transactions with at least one line referencing the item, in
    /// sequence order.
    fn txns_for_item(&self, item_id: ItemId) -> Result<Vec<Transaction>, StoreError>;

    /// Atomically persist a posting (see trait docs).
    fn commit(&self, req: CommitRequest) -> Result<CommitOutcome, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn insert_item(&self, item: Item) -> Result<Item, StoreError> {
        (**self).insert_item(item)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get_item(id)
    }

    fn find_item_by_sku(&self, sku: &str) -> Result<Option<Item>, StoreError> {
        (**self).find_item_by_sku(sku)
    }

    fn update_item(&self, item: Item) -> Result<Item, StoreError> {
        (**self).update_item(item)
    }

    fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        (**self).delete_item(id)
    }

    fn get_txn(&self, id: TxnId) -> Result<Option<Transaction>, StoreError> {
        (**self).get_txn(id)
    }

    fn txns_for_item(&self, item_id: ItemId) -> Result<Vec<Transaction>, StoreError> {
        (**self).txns_for_item(item_id)
    }

    fn commit(&self, req: CommitRequest) -> Result<CommitOutcome, StoreError> {
        (**self).commit(req)
    }
}
