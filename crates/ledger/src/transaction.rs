use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lotledger_catalog::ItemType;
use lotledger_core::{Actor, ItemId, LotId, TxnId};
use lotledger_events::Event;

/// Transaction type.
///
/// `Reversal` is reserved for the reversal engine; the public posting path
/// rejects it so every reversal carries its back-reference and marker
/// bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Receipt,
    Issue,
    Adjustment,
    Build,
    Reversal,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Receipt => "receipt",
            TxnType::Issue => "issue",
            TxnType::Adjustment => "adjustment",
            TxnType::Build => "build",
            TxnType::Reversal => "reversal",
        }
    }
}

impl core::fmt::Display for TxnType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnStatus {
    Posted,
    Reversed,
}

/// One line of a transaction.
///
/// The item/lot reference is resolved at post time into a denormalized
/// snapshot, so the line reconstructs the exact state transition without
/// re-reading history. Invariant: `*_after - *_before == qty`, exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnLine {
    pub item_id: ItemId,
    pub sku: String,
    pub name: String,
    pub item_type: ItemType,
    pub uom: String,

    pub lot_id: Option<LotId>,
    pub lot_number: Option<String>,

    /// Signed quantity delta in the item's smallest unit of measure.
    pub qty: i64,
    /// Unit cost in cents, when known.
    pub unit_cost: Option<i64>,
    /// Signed extended value (`unit_cost * qty`), when costed.
    pub total_value: Option<i64>,

    pub lot_qty_before: Option<i64>,
    pub lot_qty_after: Option<i64>,
    pub item_qty_before: i64,
    pub item_qty_after: i64,
}

/// Negative-stock flag recorded under the `AllowAndFlag` policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAnomaly {
    pub item_id: ItemId,
    pub lot_id: Option<LotId>,
    pub resulting_qty: i64,
}

/// Marker stamped on a transaction when a later transaction reverses it.
/// The only mutation a committed transaction ever receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalMarker {
    pub reversed_by: TxnId,
    pub actor: Actor,
    pub reversed_at: DateTime<Utc>,
}

/// An immutable ledger transaction.
///
/// `sequence` is 0 while unposted; the store assigns the global monotonic
/// sequence at commit and returns the committed copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxnId,
    pub sequence: u64,
    pub txn_type: TxnType,
    pub status: TxnStatus,
    pub posted_at: DateTime<Utc>,
    pub effective_date: DateTime<Utc>,
    pub actor: Actor,

    pub memo: Option<String>,
    pub project: Option<String>,
    pub department: Option<String>,
    /// Opaque correlation identifiers owned by external collaborators.
    pub batch_id: Option<String>,
    pub work_order_id: Option<String>,

    pub lines: Vec<TxnLine>,
    pub anomalies: Vec<StockAnomaly>,

    /// Back-reference to the transaction this one reverses.
    pub reverses: Option<TxnId>,
    /// Set once this transaction has been reversed.
    pub reversal: Option<ReversalMarker>,
}

impl Transaction {
    pub fn is_reversed(&self) -> bool {
        self.reversal.is_some()
    }

    pub fn touches_item(&self, item_id: ItemId) -> bool {
        self.lines.iter().any(|l| l.item_id == item_id)
    }

    /// The subset of lines pertaining to one item.
    pub fn lines_for_item(&self, item_id: ItemId) -> impl Iterator<Item = &TxnLine> {
        self.lines.iter().filter(move |l| l.item_id == item_id)
    }

    /// Clone of this transaction carrying only the lines for one item
    /// (item-scoped reader responses).
    pub fn scoped_to_item(&self, item_id: ItemId) -> Transaction {
        let mut scoped = self.clone();
        scoped.lines.retain(|l| l.item_id == item_id);
        scoped
    }
}

/// Committed ledger facts published on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    TransactionPosted(Transaction),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::TransactionPosted(_) => "ledger.txn.posted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::TransactionPosted(t) => t.posted_at,
        }
    }
}
