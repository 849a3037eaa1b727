use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lotledger_core::TxnId;

/// Envelope for a published event.
///
/// `sequence` is the global ledger sequence the store assigned to the
/// transaction at commit; it is monotonically increasing across the whole
/// ledger, which lets consumers keep a single cursor for idempotent
/// at-least-once processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    txn_id: TxnId,
    sequence: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, txn_id: TxnId, sequence: u64, payload: E) -> Self {
        Self {
            event_id,
            txn_id,
            sequence,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn txn_id(&self) -> TxnId {
        self.txn_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
