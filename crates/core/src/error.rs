//! Ledger error model.

use thiserror::Error;

use crate::id::{ItemId, LotId, TxnId};

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every operation is atomic: an error means stored state is exactly as it
/// was before the call. Keep this focused on deterministic business failures;
/// infrastructure concerns surface as `Internal`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed input (caller error).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced item/lot/transaction is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The posting would drive a quantity negative under the `Reject` policy.
    #[error("insufficient quantity on item {item}: delta {requested} against {available} on hand")]
    InsufficientQuantity {
        item: ItemId,
        lot: Option<LotId>,
        requested: i64,
        available: i64,
    },

    /// Double-reversal attempt.
    #[error("transaction {0} is already reversed")]
    AlreadyReversed(TxnId),

    /// Failed to serialize against competing writers after retries.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Unexpected infrastructure failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
