use std::sync::RwLock;

use thiserror::Error;

use lotledger_events::EventEnvelope;
use lotledger_ledger::{LedgerEvent, audit_entries};

use super::store::AuditStore;
use crate::ledger_store::StoreError;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("audit store failed: {0}")]
    Store(#[from] StoreError),

    #[error("mirror cursor lock poisoned")]
    Poisoned,
}

/// Chemical audit mirror.
///
/// Consumes published `TransactionPosted` envelopes and appends one audit
/// entry per lot-scoped chemical line. Idempotent for at-least-once
/// delivery: envelopes at or below the cursor are ignored, and the cursor
/// only advances after a successful append.
#[derive(Debug)]
pub struct ChemicalAuditMirror<S>
where
    S: AuditStore,
{
    store: S,
    cursor: RwLock<u64>,
}

impl<S> ChemicalAuditMirror<S>
where
    S: AuditStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursor: RwLock::new(0),
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor.read().map(|c| *c).unwrap_or(0)
    }

    /// Apply a published envelope into the audit store.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<LedgerEvent>,
    ) -> Result<(), MirrorError> {
        let mut cursor = self.cursor.write().map_err(|_| MirrorError::Poisoned)?;

        let seq = envelope.sequence();
        if seq <= *cursor {
            // Duplicate or replay; safe to ignore.
            return Ok(());
        }

        let LedgerEvent::TransactionPosted(txn) = envelope.payload();
        for entry in audit_entries(txn) {
            self.store.append(entry)?;
        }

        // Advance only after every entry landed.
        *cursor = seq;
        Ok(())
    }
}
