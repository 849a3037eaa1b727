//! `lotledger-infra` — storage, orchestration, and delivery.
//!
//! - `ledger_store`: the atomic item+transaction store contract and its
//!   in-memory implementation
//! - `audit`: chemical audit storage and the idempotent mirror projection
//! - `service`: the `LedgerService` orchestration layer (retry loop,
//!   publication, readers, catalog maintenance)
//! - `workers`: background consumers draining the event bus

pub mod audit;
pub mod ledger_store;
pub mod service;
pub mod workers;

#[cfg(test)]
mod integration_tests;
