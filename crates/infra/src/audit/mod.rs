//! Chemical audit storage and the mirror projection feeding it.

pub mod mirror;
pub mod store;

pub use mirror::{ChemicalAuditMirror, MirrorError};
pub use store::{AuditStore, InMemoryAuditStore};
