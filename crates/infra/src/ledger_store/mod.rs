//! Ledger storage: the atomic commit contract and implementations.

pub mod in_memory;
pub mod query;
mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use query::{Pagination, TxnFilter, TxnQueryResult};
pub use r#trait::{CommitOutcome, CommitRequest, LedgerStore, ReversalUpdate, StoreError};
