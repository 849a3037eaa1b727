//! The posting planner: the ledger writer's pure decision logic.
//!
//! `plan_posting` turns a request plus the current state of every referenced
//! item into an immutable [`Transaction`] and the updated item states. It
//! performs no IO; the service layer loads items, invokes the planner, and
//! commits the plan atomically (retrying the whole cycle on version
//! conflicts).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lotledger_catalog::Item;
use lotledger_core::{Actor, ItemId, LedgerError, LedgerResult, LotId, TxnId};

use crate::policy::NegativeStockPolicy;
use crate::transaction::{StockAnomaly, Transaction, TxnLine, TxnStatus, TxnType};

/// One requested line: bare references, resolved by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: ItemId,
    pub lot_id: Option<LotId>,
    /// Signed quantity delta; zero is rejected.
    pub qty: i64,
    /// Unit cost in cents, when known.
    pub unit_cost: Option<i64>,
}

/// A posting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest {
    pub txn_type: TxnType,
    pub lines: Vec<LineRequest>,
    pub actor: Actor,
    pub effective_date: Option<DateTime<Utc>>,
    pub memo: Option<String>,
    pub project: Option<String>,
    pub department: Option<String>,
    pub batch_id: Option<String>,
    pub work_order_id: Option<String>,
}

impl PostRequest {
    pub fn new(txn_type: TxnType, lines: Vec<LineRequest>, actor: Actor) -> Self {
        Self {
            txn_type,
            lines,
            actor,
            effective_date: None,
            memo: None,
            project: None,
            department: None,
            batch_id: None,
            work_order_id: None,
        }
    }

    /// Structural validation; runs before any state is read.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.lines.is_empty() {
            return Err(LedgerError::validation("a posting must have lines"));
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if line.qty == 0 {
                return Err(LedgerError::validation(format!(
                    "line {idx}: quantity cannot be zero"
                )));
            }
        }
        Ok(())
    }

    /// The distinct item ids this request touches, in first-seen order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut seen = Vec::new();
        for line in &self.lines {
            if !seen.contains(&line.item_id) {
                seen.push(line.item_id);
            }
        }
        seen
    }
}

/// Output of the planner: the transaction to append plus every touched item
/// in its new state (versions still as loaded; the store bumps them at
/// commit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingPlan {
    pub txn: Transaction,
    pub items: Vec<Item>,
}

/// Compute the state transition for a posting.
///
/// Lines apply sequentially: a second line on the same lot sees the first
/// line's `after` as its `before`, so the before/after chain on the
/// transaction is consistent with in-order application.
pub fn plan_posting(
    txn_id: TxnId,
    posted_at: DateTime<Utc>,
    items: &HashMap<ItemId, Item>,
    req: &PostRequest,
    reverses: Option<TxnId>,
    policy: NegativeStockPolicy,
) -> LedgerResult<PostingPlan> {
    req.validate()?;

    // Working copies, touched items only. BTreeMap keeps the returned item
    // order deterministic.
    let mut working: BTreeMap<ItemId, Item> = BTreeMap::new();
    for id in req.item_ids() {
        let item = items
            .get(&id)
            .ok_or_else(|| LedgerError::not_found(format!("item {id}")))?;
        working.insert(id, item.clone());
    }

    let mut lines = Vec::with_capacity(req.lines.len());
    let mut anomalies = Vec::new();

    for line in &req.lines {
        let item = working
            .get_mut(&line.item_id)
            .ok_or_else(|| LedgerError::not_found(format!("item {}", line.item_id)))?;

        let applied = item.apply_delta(line.lot_id, line.qty)?;

        let resulting = applied.lot_qty_after.unwrap_or(applied.item_qty_after);
        if resulting < 0 {
            match policy {
                NegativeStockPolicy::Reject => {
                    return Err(LedgerError::InsufficientQuantity {
                        item: line.item_id,
                        lot: line.lot_id,
                        requested: line.qty,
                        available: applied.lot_qty_before.unwrap_or(applied.item_qty_before),
                    });
                }
                NegativeStockPolicy::AllowAndFlag => anomalies.push(StockAnomaly {
                    item_id: line.item_id,
                    lot_id: line.lot_id,
                    resulting_qty: resulting,
                }),
            }
        }

        let lot_number = line
            .lot_id
            .and_then(|id| item.lot(id))
            .map(|l| l.lot_number.clone());

        lines.push(TxnLine {
            item_id: item.id,
            sku: item.sku.clone(),
            name: item.name.clone(),
            item_type: item.item_type,
            uom: item.uom.clone(),
            lot_id: line.lot_id,
            lot_number,
            qty: line.qty,
            unit_cost: line.unit_cost,
            total_value: line.unit_cost.map(|c| c * line.qty),
            lot_qty_before: applied.lot_qty_before,
            lot_qty_after: applied.lot_qty_after,
            item_qty_before: applied.item_qty_before,
            item_qty_after: applied.item_qty_after,
        });
    }

    let txn = Transaction {
        id: txn_id,
        sequence: 0,
        txn_type: req.txn_type,
        status: TxnStatus::Posted,
        posted_at,
        effective_date: req.effective_date.unwrap_or(posted_at),
        actor: req.actor.clone(),
        memo: req.memo.clone(),
        project: req.project.clone(),
        department: req.department.clone(),
        batch_id: req.batch_id.clone(),
        work_order_id: req.work_order_id.clone(),
        lines,
        anomalies,
        reverses,
        reversal: None,
    };

    Ok(PostingPlan {
        txn,
        items: working.into_values().collect(),
    })
}

/// Build the request that reverses `original`: same items/lots, negated
/// quantities, memo tagged with the reason and the original id.
pub fn reversal_request(original: &Transaction, actor: Actor, reason: &str) -> PostRequest {
    let lines = original
        .lines
        .iter()
        .map(|l| LineRequest {
            item_id: l.item_id,
            lot_id: l.lot_id,
            qty: -l.qty,
            unit_cost: l.unit_cost,
        })
        .collect();

    PostRequest {
        txn_type: TxnType::Reversal,
        lines,
        actor,
        effective_date: None,
        memo: Some(format!("reversal of {}: {}", original.id, reason)),
        project: original.project.clone(),
        department: original.department.clone(),
        batch_id: original.batch_id.clone(),
        work_order_id: original.work_order_id.clone(),
    }
}
