//! Ledger orchestration (application-level pipeline).
//!
//! `LedgerService` implements the posting pipeline over the storage and bus
//! traits:
//!
//! ```text
//! request
//!   ↓
//! 1. Validate (structural, before any IO)
//!   ↓
//! 2. Load every referenced item
//!   ↓
//! 3. Plan (pure decision logic: snapshots, policy)
//!   ↓
//! 4. Commit atomically (optimistic concurrency; conflict → back to 2)
//!   ↓
//! 5. Publish the committed fact (best-effort; never rolls back 4)
//! ```
//!
//! Steps 2–4 retry as a unit up to `max_commit_retries` times when a
//! competing writer invalidates a loaded version, then surface
//! `ConcurrencyConflictError`. This is the only writer of item quantities;
//! catalog maintenance here touches non-quantity state only.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lotledger_catalog::{BomComponent, Item, ItemType, Lot};
use lotledger_core::{Actor, ItemId, LedgerError, LedgerResult, LotId, TxnId};
use lotledger_events::{EventBus, EventEnvelope};
use lotledger_ledger::{
    LedgerEvent, NegativeStockPolicy, PostRequest, ReversalMarker, Transaction, TxnLine, TxnType,
    plan_posting, reversal_request,
};

use crate::ledger_store::{
    CommitRequest, LedgerStore, Pagination, ReversalUpdate, StoreError, TxnFilter, TxnQueryResult,
};

/// Service-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    pub negative_stock: NegativeStockPolicy,
    /// Bound on load-plan-commit attempts under contention.
    pub max_commit_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            negative_stock: NegativeStockPolicy::Reject,
            max_commit_retries: 5,
        }
    }
}

/// Successful posting: the committed transaction and the updated items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostOutcome {
    pub txn: Transaction,
    pub items: Vec<Item>,
}

/// Per-type slice of an item's activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    pub txn_type: TxnType,
    pub qty_in: i64,
    pub qty_out: i64,
    pub txn_count: u64,
}

/// Aggregated quantity movement for one item within a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub item_id: ItemId,
    /// Sum of positive deltas.
    pub total_in: i64,
    /// Sum of magnitudes of negative deltas.
    pub total_out: i64,
    pub net: i64,
    pub by_type: Vec<TypeStats>,
}

/// One step of a lot's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotHistoryEntry {
    pub txn_id: TxnId,
    pub sequence: u64,
    pub txn_type: TxnType,
    pub posted_at: DateTime<Utc>,
    pub actor: Actor,
    pub line: TxnLine,
}

/// The inventory transaction ledger service.
#[derive(Debug)]
pub struct LedgerService<S, B> {
    store: S,
    bus: B,
    config: LedgerConfig,
}

impl<S, B> LedgerService<S, B> {
    pub fn new(store: S, bus: B, config: LedgerConfig) -> Self {
        Self { store, bus, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl<S, B> LedgerService<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<LedgerEvent>>,
{
    // ---- Ledger writer -------------------------------------------------

    /// Post a transaction against the ledger.
    pub fn post(&self, req: PostRequest) -> LedgerResult<PostOutcome> {
        if req.txn_type == TxnType::Reversal {
            return Err(LedgerError::validation(
                "reversal transactions are posted through reverse()",
            ));
        }
        req.validate()?;
        self.execute(&req, None)
    }

    /// Post the equal-and-opposite transaction for a prior posting and mark
    /// the original reversed, atomically.
    pub fn reverse(
        &self,
        txn_id: TxnId,
        actor: Actor,
        reason: &str,
    ) -> LedgerResult<Transaction> {
        let original = self.get_transaction(txn_id)?;
        if original.is_reversed() {
            return Err(LedgerError::AlreadyReversed(txn_id));
        }

        let req = reversal_request(&original, actor, reason);
        let outcome = self.execute(&req, Some(txn_id))?;
        Ok(outcome.txn)
    }

    /// The retried load-plan-commit cycle shared by `post` and `reverse`.
    fn execute(&self, req: &PostRequest, reverse_of: Option<TxnId>) -> LedgerResult<PostOutcome> {
        let mut attempt = 0u32;
        loop {
            let items = self.load_items(req)?;
            let plan = plan_posting(
                TxnId::new(),
                Utc::now(),
                &items,
                req,
                reverse_of,
                self.config.negative_stock,
            )?;

            let mark_reversed = reverse_of.map(|original| ReversalUpdate {
                original,
                marker: ReversalMarker {
                    reversed_by: plan.txn.id,
                    actor: plan.txn.actor.clone(),
                    reversed_at: plan.txn.posted_at,
                },
            });

            match self.store.commit(CommitRequest {
                txn: plan.txn,
                items: plan.items,
                mark_reversed,
            }) {
                Ok(outcome) => {
                    self.publish(&outcome.txn);
                    return Ok(PostOutcome {
                        txn: outcome.txn,
                        items: outcome.items,
                    });
                }
                Err(StoreError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt >= self.config.max_commit_retries {
                        return Err(LedgerError::conflict(format!(
                            "gave up after {attempt} attempts: {msg}"
                        )));
                    }
                    tracing::debug!(attempt, %msg, "commit conflict; retrying");
                }
                Err(e) => return Err(map_store_error(e)),
            }
        }
    }

    fn load_items(&self, req: &PostRequest) -> LedgerResult<HashMap<ItemId, Item>> {
        let mut items = HashMap::new();
        for id in req.item_ids() {
            let item = self
                .store
                .get_item(id)
                .map_err(map_store_error)?
                .ok_or_else(|| LedgerError::not_found(format!("item {id}")))?;
            items.insert(id, item);
        }
        Ok(items)
    }

    /// Best-effort publication. The transaction is durable by now; a dropped
    /// publish only delays the audit mirror, so it is logged and swallowed.
    fn publish(&self, txn: &Transaction) {
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            txn.id,
            txn.sequence,
            LedgerEvent::TransactionPosted(txn.clone()),
        );
        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(txn_id = %txn.id, error = ?e, "failed to publish posted transaction");
        }
    }

    // ---- Ledger reader -------------------------------------------------

    pub fn get_transaction(&self, id: TxnId) -> LedgerResult<Transaction> {
        self.store
            .get_txn(id)
            .map_err(map_store_error)?
            .ok_or_else(|| LedgerError::not_found(format!("transaction {id}")))
    }

    /// Transactions touching an item, filtered, newest first; each returned
    /// transaction carries only the lines for that item.
    pub fn list_by_item(
        &self,
        item_id: ItemId,
        filter: &TxnFilter,
        pagination: Pagination,
    ) -> LedgerResult<TxnQueryResult> {
        self.require_item(item_id)?;

        let mut matching: Vec<Transaction> = self
            .store
            .txns_for_item(item_id)
            .map_err(map_store_error)?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        matching.sort_by_key(|t| std::cmp::Reverse((t.posted_at, t.sequence)));

        let total = matching.len() as u64;
        let transactions: Vec<Transaction> = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .map(|t| t.scoped_to_item(item_id))
            .collect();
        let has_more = u64::from(pagination.offset) + (transactions.len() as u64) < total;

        Ok(TxnQueryResult {
            transactions,
            total,
            pagination,
            has_more,
        })
    }

    /// Quantity in/out aggregation for one item within a window. Pure
    /// aggregation, no mutation.
    pub fn item_stats(
        &self,
        item_id: ItemId,
        posted_after: Option<DateTime<Utc>>,
        posted_before: Option<DateTime<Utc>>,
    ) -> LedgerResult<ItemStats> {
        self.require_item(item_id)?;

        let window = TxnFilter {
            txn_type: None,
            posted_after,
            posted_before,
        };

        let mut total_in = 0i64;
        let mut total_out = 0i64;
        let mut by_type: BTreeMap<&'static str, TypeStats> = BTreeMap::new();

        for txn in self
            .store
            .txns_for_item(item_id)
            .map_err(map_store_error)?
        {
            if !window.matches(&txn) {
                continue;
            }

            let slot = by_type.entry(txn.txn_type.as_str()).or_insert(TypeStats {
                txn_type: txn.txn_type,
                qty_in: 0,
                qty_out: 0,
                txn_count: 0,
            });
            slot.txn_count += 1;

            for line in txn.lines_for_item(item_id) {
                if line.qty > 0 {
                    total_in += line.qty;
                    slot.qty_in += line.qty;
                } else {
                    total_out += -line.qty;
                    slot.qty_out += -line.qty;
                }
            }
        }

        Ok(ItemStats {
            item_id,
            total_in,
            total_out,
            net: total_in - total_out,
            by_type: by_type.into_values().collect(),
        })
    }

    /// Every line touching one lot, chronological. History survives lot
    /// removal; `NotFound` only when the lot neither exists on the item nor
    /// appears in any recorded line.
    pub fn lot_history(&self, item_id: ItemId, lot_id: LotId) -> LedgerResult<Vec<LotHistoryEntry>> {
        let item = self.require_item(item_id)?;

        let entries: Vec<LotHistoryEntry> = self
            .store
            .txns_for_item(item_id)
            .map_err(map_store_error)?
            .into_iter()
            .flat_map(|txn| {
                let meta = (txn.id, txn.sequence, txn.txn_type, txn.posted_at);
                let actor = txn.actor.clone();
                txn.lines
                    .into_iter()
                    .filter(|l| l.item_id == item_id && l.lot_id == Some(lot_id))
                    .map(move |line| LotHistoryEntry {
                        txn_id: meta.0,
                        sequence: meta.1,
                        txn_type: meta.2,
                        posted_at: meta.3,
                        actor: actor.clone(),
                        line,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        if entries.is_empty() && item.lot(lot_id).is_none() {
            return Err(LedgerError::not_found(format!(
                "lot {lot_id} on item {item_id}"
            )));
        }

        Ok(entries)
    }

    // ---- Catalog maintenance ------------------------------------------

    pub fn create_item(
        &self,
        sku: &str,
        name: &str,
        item_type: ItemType,
        uom: &str,
        bom: Vec<BomComponent>,
    ) -> LedgerResult<Item> {
        if sku.trim().is_empty() {
            return Err(LedgerError::validation("sku cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(LedgerError::validation("name cannot be empty"));
        }

        let mut item = Item::new(sku, name, item_type, uom);
        item.bom = bom;

        match self.store.insert_item(item) {
            Ok(item) => Ok(item),
            // Duplicate id/SKU is a caller error, not an infrastructure one.
            Err(StoreError::InvalidCommit(msg)) => Err(LedgerError::validation(msg)),
            Err(e) => Err(map_store_error(e)),
        }
    }

    pub fn get_item(&self, id: ItemId) -> LedgerResult<Item> {
        self.require_item(id)
    }

    pub fn delete_item(&self, id: ItemId) -> LedgerResult<()> {
        self.store.delete_item(id).map_err(map_store_error)
    }

    /// Add a lot to an item. The lot starts at zero; a non-zero
    /// `opening_qty` is then posted as a `receipt`, so the opening quantity
    /// flows through the ledger like any other change.
    pub fn add_lot(
        &self,
        item_id: ItemId,
        lot_number: &str,
        expires_at: Option<DateTime<Utc>>,
        opening_qty: i64,
        actor: Actor,
    ) -> LedgerResult<(Item, Option<Transaction>)> {
        if lot_number.trim().is_empty() {
            return Err(LedgerError::validation("lot number cannot be empty"));
        }
        if opening_qty < 0 {
            return Err(LedgerError::validation(
                "opening quantity cannot be negative",
            ));
        }

        let (item, lot_id) = self.update_item_retrying(item_id, |item| {
            let lot = Lot::new(lot_number, expires_at);
            let lot_id = lot.id;
            item.add_lot(lot)?;
            Ok(lot_id)
        })?;

        if opening_qty == 0 {
            return Ok((item, None));
        }

        let req = PostRequest::new(
            TxnType::Receipt,
            vec![lotledger_ledger::LineRequest {
                item_id,
                lot_id: Some(lot_id),
                qty: opening_qty,
                unit_cost: None,
            }],
            actor,
        );
        let outcome = self.execute(&req, None)?;
        let item = outcome
            .items
            .into_iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| LedgerError::internal("posted item missing from commit outcome"))?;
        Ok((item, Some(outcome.txn)))
    }

    /// Remove a zero-quantity lot.
    pub fn remove_lot(&self, item_id: ItemId, lot_id: LotId) -> LedgerResult<Item> {
        let (item, _) = self.update_item_retrying(item_id, |item| {
            item.remove_lot(lot_id).map(|_| ())
        })?;
        Ok(item)
    }

    // ---- helpers -------------------------------------------------------

    fn require_item(&self, id: ItemId) -> LedgerResult<Item> {
        self.store
            .get_item(id)
            .map_err(map_store_error)?
            .ok_or_else(|| LedgerError::not_found(format!("item {id}")))
    }

    /// Load-mutate-update with the same bounded retry discipline as posting.
    fn update_item_retrying<T>(
        &self,
        item_id: ItemId,
        mutate: impl Fn(&mut Item) -> LedgerResult<T>,
    ) -> LedgerResult<(Item, T)> {
        let mut attempt = 0u32;
        loop {
            let mut item = self.require_item(item_id)?;
            let value = mutate(&mut item)?;

            match self.store.update_item(item) {
                Ok(item) => return Ok((item, value)),
                Err(StoreError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt >= self.config.max_commit_retries {
                        return Err(LedgerError::conflict(format!(
                            "gave up after {attempt} attempts: {msg}"
                        )));
                    }
                }
                Err(e) => return Err(map_store_error(e)),
            }
        }
    }
}

fn map_store_error(e: StoreError) -> LedgerError {
    match e {
        StoreError::Conflict(msg) => LedgerError::conflict(msg),
        StoreError::NotFound(msg) => LedgerError::not_found(msg),
        StoreError::AlreadyReversed(id) => LedgerError::AlreadyReversed(id),
        StoreError::InvalidCommit(msg) => LedgerError::internal(msg),
    }
}
