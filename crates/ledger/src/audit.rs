//! Chemical audit classification.
//!
//! Chemical items get one denormalized, human-readable audit entry per
//! lot-scoped line of every committed transaction. Entries are snapshot
//! copies: later item edits never retroactively alter them. This module is
//! the pure classifier; storage and delivery live in the infra layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lotledger_catalog::ItemType;
use lotledger_core::{Actor, AuditEntryId, ItemId, LotId, TxnId};

use crate::transaction::{Transaction, TxnType};

/// Classification of a chemical quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// Consumption (issue/build draw-down).
    Use,
    /// Consumption that emptied the lot.
    Deplete,
    /// Positive correction outside a receipt.
    Adjust,
    /// Negative correction (adjustment/reversal).
    Remove,
    /// Stock added by a receipt or build output.
    Add,
}

/// One denormalized audit entry (chemical items only, one per affected lot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalAudit {
    pub id: AuditEntryId,
    pub txn_id: TxnId,
    /// Global ledger sequence of the originating transaction.
    pub sequence: u64,

    pub item_id: ItemId,
    pub sku: String,
    pub name: String,
    pub lot_id: LotId,
    pub lot_number: String,

    /// Signed quantity change.
    pub qty: i64,
    /// Lot quantity remaining after the change.
    pub remaining: i64,

    pub actor: Actor,
    pub action: AuditAction,
    pub notes: Option<String>,
    pub project: Option<String>,
    pub department: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Classify one lot-scoped quantity change.
pub fn classify(txn_type: TxnType, qty: i64, lot_qty_after: i64) -> AuditAction {
    if qty < 0 {
        if lot_qty_after == 0 {
            AuditAction::Deplete
        } else {
            match txn_type {
                TxnType::Adjustment | TxnType::Reversal => AuditAction::Remove,
                _ => AuditAction::Use,
            }
        }
    } else {
        match txn_type {
            TxnType::Receipt | TxnType::Build => AuditAction::Add,
            _ => AuditAction::Adjust,
        }
    }
}

/// Derive the audit entries a committed transaction produces: one per
/// lot-scoped line on a chemical item. Lines without a lot and lines on
/// non-chemical items produce nothing.
pub fn audit_entries(txn: &Transaction) -> Vec<ChemicalAudit> {
    txn.lines
        .iter()
        .filter(|line| line.item_type == ItemType::Chemical)
        .filter_map(|line| {
            let lot_id = line.lot_id?;
            let lot_number = line.lot_number.clone()?;
            let remaining = line.lot_qty_after?;

            Some(ChemicalAudit {
                id: AuditEntryId::new(),
                txn_id: txn.id,
                sequence: txn.sequence,
                item_id: line.item_id,
                sku: line.sku.clone(),
                name: line.name.clone(),
                lot_id,
                lot_number,
                qty: line.qty,
                remaining,
                actor: txn.actor.clone(),
                action: classify(txn.txn_type, line.qty, remaining),
                notes: txn.memo.clone(),
                project: txn.project.clone(),
                department: txn.department.clone(),
                occurred_at: txn.posted_at,
            })
        })
        .collect()
}
