//! `lotledger-core` — ledger foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod actor;
pub mod error;
pub mod id;
pub mod version;

pub use actor::Actor;
pub use error::{LedgerError, LedgerResult};
pub use id::{ActorId, AuditEntryId, ItemId, LotId, TxnId};
pub use version::ExpectedVersion;
