use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lotledger_core::{ItemId, LedgerError, LedgerResult, LotId};

/// Kind of catalog item. Chemical items additionally feed the denormalized
/// chemical audit trail on every lot-scoped posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Chemical,
    Solution,
    Product,
}

/// A tracked sub-quantity of an item, identified by a human-readable lot
/// number (not necessarily unique across items).
///
/// Quantities are `i64` in the item's smallest unit of measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub lot_number: String,
    pub qty: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Lot {
    pub fn new(lot_number: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: LotId::new(),
            lot_number: lot_number.into(),
            qty: 0,
            expires_at,
        }
    }
}

/// One component of an item's bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomComponent {
    pub component: ItemId,
    pub qty: i64,
    pub uom: String,
}

/// A catalog item.
///
/// Quantity fields are mutated exclusively through the ledger's posting
/// algorithm; catalog maintenance may only touch non-quantity state (and add
/// or remove zero-quantity lots). `version` is bumped by the store on every
/// committed mutation and backs optimistic concurrency.
///
/// Invariant: when the item carries lots, `on_hand` equals the sum of its
/// lots' quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub sku: String,
    pub name: String,
    pub item_type: ItemType,
    pub uom: String,
    pub on_hand: i64,
    pub lots: Vec<Lot>,
    pub bom: Vec<BomComponent>,
    pub version: u64,
}

/// Before/after snapshot produced by applying one signed delta to an item
/// (and optionally one of its lots).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDelta {
    pub lot_qty_before: Option<i64>,
    pub lot_qty_after: Option<i64>,
    pub item_qty_before: i64,
    pub item_qty_after: i64,
}

impl Item {
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        item_type: ItemType,
        uom: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::new(),
            sku: sku.into(),
            name: name.into(),
            item_type,
            uom: uom.into(),
            on_hand: 0,
            lots: Vec::new(),
            bom: Vec::new(),
            version: 0,
        }
    }

    pub fn is_lot_tracked(&self) -> bool {
        !self.lots.is_empty()
    }

    pub fn lot(&self, id: LotId) -> Option<&Lot> {
        self.lots.iter().find(|l| l.id == id)
    }

    pub fn lot_by_number(&self, lot_number: &str) -> Option<&Lot> {
        self.lots.iter().find(|l| l.lot_number == lot_number)
    }

    pub fn lot_sum(&self) -> i64 {
        self.lots.iter().map(|l| l.qty).sum()
    }

    /// Apply one signed quantity delta, returning the before/after snapshot
    /// the transaction line records.
    ///
    /// - A lot id is required when the item is lot-tracked (a lot-less line
    ///   would desynchronize `on_hand` from the lot sum) and rejected when it
    ///   is not.
    /// - Negative results are NOT rejected here; the posting planner owns the
    ///   negative-stock policy.
    pub fn apply_delta(&mut self, lot_id: Option<LotId>, qty: i64) -> LedgerResult<AppliedDelta> {
        let (lot_qty_before, lot_qty_after) = match lot_id {
            Some(lot_id) => {
                let lot = self
                    .lots
                    .iter_mut()
                    .find(|l| l.id == lot_id)
                    .ok_or_else(|| {
                        LedgerError::not_found(format!("lot {lot_id} on item {}", self.id))
                    })?;
                let before = lot.qty;
                lot.qty += qty;
                (Some(before), Some(lot.qty))
            }
            None => {
                if self.is_lot_tracked() {
                    return Err(LedgerError::validation(format!(
                        "item {} is lot-tracked; a lot id is required",
                        self.id
                    )));
                }
                (None, None)
            }
        };

        let item_qty_before = self.on_hand;
        self.on_hand += qty;

        Ok(AppliedDelta {
            lot_qty_before,
            lot_qty_after,
            item_qty_before,
            item_qty_after: self.on_hand,
        })
    }

    /// Add a zero-quantity lot (catalog maintenance; any opening quantity is
    /// posted through the ledger afterwards).
    pub fn add_lot(&mut self, lot: Lot) -> LedgerResult<()> {
        if lot.qty != 0 {
            return Err(LedgerError::validation(
                "new lots start at zero quantity; post a receipt for the opening quantity",
            ));
        }
        if self.lot_by_number(&lot.lot_number).is_some() {
            return Err(LedgerError::validation(format!(
                "lot number '{}' already exists on item {}",
                lot.lot_number, self.id
            )));
        }
        self.lots.push(lot);
        Ok(())
    }

    /// Remove a lot. Only zero-quantity lots may be removed; anything else
    /// would change `on_hand` outside the ledger.
    pub fn remove_lot(&mut self, lot_id: LotId) -> LedgerResult<Lot> {
        let idx = self
            .lots
            .iter()
            .position(|l| l.id == lot_id)
            .ok_or_else(|| LedgerError::not_found(format!("lot {lot_id} on item {}", self.id)))?;
        if self.lots[idx].qty != 0 {
            return Err(LedgerError::validation(format!(
                "lot {lot_id} still has quantity {}; it cannot be removed",
                self.lots[idx].qty
            )));
        }
        Ok(self.lots.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lot_tracked_item(qty: i64) -> (Item, LotId) {
        let mut item = Item::new("CHEM-001", "Acetone", ItemType::Chemical, "mL");
        let lot = Lot::new("LOT-A", None);
        let lot_id = lot.id;
        item.add_lot(lot).unwrap();
        item.apply_delta(Some(lot_id), qty).unwrap();
        (item, lot_id)
    }

    #[test]
    fn apply_delta_records_before_and_after() {
        let (mut item, lot_id) = lot_tracked_item(50);

        let applied = item.apply_delta(Some(lot_id), -20).unwrap();
        assert_eq!(applied.lot_qty_before, Some(50));
        assert_eq!(applied.lot_qty_after, Some(30));
        assert_eq!(applied.item_qty_before, 50);
        assert_eq!(applied.item_qty_after, 30);
        assert_eq!(item.on_hand, item.lot_sum());
    }

    #[test]
    fn missing_lot_is_not_found() {
        let (mut item, _) = lot_tracked_item(10);
        let err = item.apply_delta(Some(LotId::new()), -1).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn lot_tracked_item_requires_a_lot() {
        let (mut item, _) = lot_tracked_item(10);
        let err = item.apply_delta(None, 5).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn untracked_item_adjusts_on_hand_directly() {
        let mut item = Item::new("SOL-1", "Buffer", ItemType::Solution, "mL");
        let applied = item.apply_delta(None, 12).unwrap();
        assert_eq!(applied.lot_qty_before, None);
        assert_eq!(applied.item_qty_after, 12);
    }

    #[test]
    fn duplicate_lot_number_rejected() {
        let mut item = Item::new("CHEM-002", "Ethanol", ItemType::Chemical, "mL");
        item.add_lot(Lot::new("LOT-A", None)).unwrap();
        let err = item.add_lot(Lot::new("LOT-A", None)).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn only_empty_lots_can_be_removed() {
        let (mut item, lot_id) = lot_tracked_item(5);
        assert!(matches!(
            item.remove_lot(lot_id).unwrap_err(),
            LedgerError::Validation(_)
        ));

        item.apply_delta(Some(lot_id), -5).unwrap();
        let removed = item.remove_lot(lot_id).unwrap();
        assert_eq!(removed.qty, 0);
        assert!(!item.is_lot_tracked());
    }

    proptest! {
        /// Property: the lot-sum invariant holds across any delta sequence.
        #[test]
        fn on_hand_tracks_lot_sum(deltas in prop::collection::vec(-1_000i64..1_000, 1..50)) {
            let (mut item, lot_id) = lot_tracked_item(0);
            for d in deltas {
                if d != 0 {
                    item.apply_delta(Some(lot_id), d).unwrap();
                }
            }
            prop_assert_eq!(item.on_hand, item.lot_sum());
        }
    }
}
