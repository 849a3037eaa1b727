//! `lotledger-ledger` — the inventory transaction ledger core.
//!
//! Pure decision logic: the posting planner computes new item state and an
//! immutable transaction record from a request, without performing IO. The
//! infra layer owns persistence, atomicity, and retries.

pub mod audit;
pub mod policy;
pub mod posting;
pub mod transaction;

pub use audit::{AuditAction, ChemicalAudit, audit_entries};
pub use policy::NegativeStockPolicy;
pub use posting::{LineRequest, PostRequest, PostingPlan, plan_posting, reversal_request};
pub use transaction::{
    LedgerEvent, ReversalMarker, StockAnomaly, Transaction, TxnLine, TxnStatus, TxnType,
};
