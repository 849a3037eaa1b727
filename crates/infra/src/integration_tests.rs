//! End-to-end tests over the service, the in-memory store, and the bus.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use lotledger_catalog::{Item, ItemType};
use lotledger_core::{Actor, ActorId, LedgerError, LotId, TxnId};
use lotledger_events::{EventEnvelope, InMemoryEventBus};
use lotledger_ledger::{
    AuditAction, LedgerEvent, LineRequest, NegativeStockPolicy, PostRequest, TxnStatus, TxnType,
};

use crate::audit::{AuditStore, ChemicalAuditMirror, InMemoryAuditStore};
use crate::ledger_store::{InMemoryLedgerStore, Pagination, TxnFilter};
use crate::service::{LedgerConfig, LedgerService, PostOutcome};
use crate::workers::AuditWorker;

type TestBus = Arc<InMemoryEventBus<EventEnvelope<LedgerEvent>>>;
type TestService = LedgerService<Arc<InMemoryLedgerStore>, TestBus>;

fn test_actor() -> Actor {
    Actor::new(ActorId::new(), "tester").with_role("lab-tech")
}

fn service_with(config: LedgerConfig) -> (TestService, Arc<InMemoryLedgerStore>, TestBus) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let bus: TestBus = Arc::new(InMemoryEventBus::new());
    let service = LedgerService::new(Arc::clone(&store), Arc::clone(&bus), config);
    (service, store, bus)
}

fn default_service() -> (TestService, Arc<InMemoryLedgerStore>, TestBus) {
    service_with(LedgerConfig::default())
}

/// Create a chemical item with one lot holding `opening` units.
fn seeded_chemical(service: &TestService, opening: i64) -> (Item, LotId) {
    let item = service
        .create_item("CHEM-001", "Acetone", ItemType::Chemical, "mL", vec![])
        .unwrap();
    let (item, _) = service
        .add_lot(item.id, "LOT-A", None, opening, test_actor())
        .unwrap();
    let lot_id = item.lot_by_number("LOT-A").unwrap().id;
    (item, lot_id)
}

fn issue(service: &TestService, item: &Item, lot_id: LotId, qty: i64) -> PostOutcome {
    service
        .post(PostRequest::new(
            TxnType::Issue,
            vec![LineRequest {
                item_id: item.id,
                lot_id: Some(lot_id),
                qty,
                unit_cost: None,
            }],
            test_actor(),
        ))
        .unwrap()
}

#[test]
fn posting_updates_lot_and_records_snapshots() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 50);

    let outcome = issue(&service, &item, lot_id, -20);
    let line = &outcome.txn.lines[0];
    assert_eq!(line.lot_qty_before, Some(50));
    assert_eq!(line.lot_qty_after, Some(30));
    assert_eq!(line.item_qty_before, 50);
    assert_eq!(line.item_qty_after, 30);
    assert!(outcome.txn.sequence > 0);

    let item = service.get_item(item.id).unwrap();
    assert_eq!(item.on_hand, 30);
    assert_eq!(item.lot(lot_id).unwrap().qty, 30);
}

#[test]
fn reversal_restores_quantity_and_marks_original() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 50);

    let original = issue(&service, &item, lot_id, -20);
    let reversing = service
        .reverse(original.txn.id, test_actor(), "posted in error")
        .unwrap();

    assert_eq!(reversing.txn_type, TxnType::Reversal);
    assert_eq!(reversing.reverses, Some(original.txn.id));
    assert_eq!(reversing.lines[0].qty, 20);
    assert_eq!(reversing.lines[0].lot_qty_before, Some(30));
    assert_eq!(reversing.lines[0].lot_qty_after, Some(50));

    let item = service.get_item(item.id).unwrap();
    assert_eq!(item.lot(lot_id).unwrap().qty, 50);

    let original = service.get_transaction(original.txn.id).unwrap();
    assert_eq!(original.status, TxnStatus::Reversed);
    let marker = original.reversal.unwrap();
    assert_eq!(marker.reversed_by, reversing.id);
}

#[test]
fn double_reversal_is_rejected() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 50);

    let original = issue(&service, &item, lot_id, -20);
    service
        .reverse(original.txn.id, test_actor(), "first")
        .unwrap();

    let err = service
        .reverse(original.txn.id, test_actor(), "second")
        .unwrap_err();
    assert_eq!(err, LedgerError::AlreadyReversed(original.txn.id));
}

#[test]
fn reversing_an_unknown_transaction_is_not_found() {
    let (service, _, _) = default_service();
    let err = service
        .reverse(TxnId::new(), test_actor(), "nothing there")
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[test]
fn rejected_posting_mutates_nothing() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 50);

    // Zero quantity → validation failure.
    let err = service
        .post(PostRequest::new(
            TxnType::Issue,
            vec![LineRequest {
                item_id: item.id,
                lot_id: Some(lot_id),
                qty: 0,
                unit_cost: None,
            }],
            test_actor(),
        ))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Unknown lot → not found.
    let err = service
        .post(PostRequest::new(
            TxnType::Issue,
            vec![LineRequest {
                item_id: item.id,
                lot_id: Some(LotId::new()),
                qty: -1,
                unit_cost: None,
            }],
            test_actor(),
        ))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));

    // Only the opening receipt is on the books; quantity is untouched.
    let item = service.get_item(item.id).unwrap();
    assert_eq!(item.on_hand, 50);
    let listed = service
        .list_by_item(item.id, &TxnFilter::default(), Pagination::default())
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.transactions[0].txn_type, TxnType::Receipt);
}

#[test]
fn direct_reversal_type_posting_is_rejected() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 50);

    let err = service
        .post(PostRequest::new(
            TxnType::Reversal,
            vec![LineRequest {
                item_id: item.id,
                lot_id: Some(lot_id),
                qty: 1,
                unit_cost: None,
            }],
            test_actor(),
        ))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn reject_policy_surfaces_insufficient_quantity() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 10);

    let err = service
        .post(PostRequest::new(
            TxnType::Issue,
            vec![LineRequest {
                item_id: item.id,
                lot_id: Some(lot_id),
                qty: -11,
                unit_cost: None,
            }],
            test_actor(),
        ))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientQuantity { .. }));
    assert_eq!(service.get_item(item.id).unwrap().on_hand, 10);
}

#[test]
fn allow_policy_flags_the_committed_anomaly() {
    let (service, _, _) = service_with(LedgerConfig {
        negative_stock: NegativeStockPolicy::AllowAndFlag,
        ..LedgerConfig::default()
    });
    let (item, lot_id) = seeded_chemical(&service, 10);

    let outcome = issue(&service, &item, lot_id, -12);
    assert_eq!(outcome.txn.anomalies.len(), 1);
    assert_eq!(outcome.txn.anomalies[0].resulting_qty, -2);
    assert_eq!(service.get_item(item.id).unwrap().on_hand, -2);
}

#[test]
fn list_by_item_scopes_filters_and_paginates() {
    let (service, _, _) = default_service();
    let (chem, lot_id) = seeded_chemical(&service, 100);
    let other = service
        .create_item("SOL-1", "Buffer", ItemType::Solution, "mL", vec![])
        .unwrap();

    // A multi-item build: only the chemical line must show up in the
    // chemical's listing.
    service
        .post(PostRequest::new(
            TxnType::Build,
            vec![
                LineRequest {
                    item_id: chem.id,
                    lot_id: Some(lot_id),
                    qty: -10,
                    unit_cost: None,
                },
                LineRequest {
                    item_id: other.id,
                    lot_id: None,
                    qty: 10,
                    unit_cost: None,
                },
            ],
            test_actor(),
        ))
        .unwrap();
    issue(&service, &chem, lot_id, -5);

    let all = service
        .list_by_item(chem.id, &TxnFilter::default(), Pagination::default())
        .unwrap();
    // Opening receipt + build + issue, newest first.
    assert_eq!(all.total, 3);
    assert_eq!(all.transactions[0].txn_type, TxnType::Issue);
    assert!(all.transactions.iter().all(|t| t
        .lines
        .iter()
        .all(|l| l.item_id == chem.id)));

    let issues_only = service
        .list_by_item(
            chem.id,
            &TxnFilter {
                txn_type: Some(TxnType::Issue),
                ..TxnFilter::default()
            },
            Pagination::default(),
        )
        .unwrap();
    assert_eq!(issues_only.total, 1);

    let first_page = service
        .list_by_item(
            chem.id,
            &TxnFilter::default(),
            Pagination::new(Some(2), None),
        )
        .unwrap();
    assert_eq!(first_page.transactions.len(), 2);
    assert!(first_page.has_more);

    let err = service
        .list_by_item(
            lotledger_core::ItemId::new(),
            &TxnFilter::default(),
            Pagination::default(),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[test]
fn item_stats_sum_the_window() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 50);

    let original = issue(&service, &item, lot_id, -20);
    service
        .reverse(original.txn.id, test_actor(), "undo")
        .unwrap();

    let stats = service.item_stats(item.id, None, None).unwrap();
    // Opening receipt 50 + reversal 20 in; issue 20 out.
    assert_eq!(stats.total_in, 70);
    assert_eq!(stats.total_out, 20);
    assert_eq!(stats.net, 50);

    let issue_slice = stats
        .by_type
        .iter()
        .find(|s| s.txn_type == TxnType::Issue)
        .unwrap();
    assert_eq!(issue_slice.qty_out, 20);
    assert_eq!(issue_slice.txn_count, 1);

    // A window starting after everything was posted is empty.
    let later = service
        .item_stats(item.id, Some(Utc::now()), None)
        .unwrap();
    assert_eq!(later.total_in, 0);
    assert_eq!(later.total_out, 0);
}

#[test]
fn lot_history_is_chronological_and_survives_lot_removal() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 50);

    issue(&service, &item, lot_id, -20);
    let item = service.get_item(item.id).unwrap();
    issue(&service, &item, lot_id, -30);

    let history = service.lot_history(item.id, lot_id).unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert_eq!(history[0].line.lot_qty_before, Some(0));
    assert_eq!(history[2].line.lot_qty_after, Some(0));

    // The lot is empty now; remove it. History stays queryable.
    service.remove_lot(item.id, lot_id).unwrap();
    assert_eq!(service.lot_history(item.id, lot_id).unwrap().len(), 3);

    // A lot that never existed is not found.
    let err = service.lot_history(item.id, LotId::new()).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[test]
fn catalog_rules_are_enforced() {
    let (service, _, _) = default_service();
    let (item, lot_id) = seeded_chemical(&service, 10);

    // Duplicate SKU.
    let err = service
        .create_item("CHEM-001", "Other", ItemType::Chemical, "mL", vec![])
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Duplicate lot number on the same item.
    let err = service
        .add_lot(item.id, "LOT-A", None, 0, test_actor())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Non-empty lot cannot be removed.
    let err = service.remove_lot(item.id, lot_id).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    service.delete_item(item.id).unwrap();
    assert!(matches!(
        service.get_item(item.id).unwrap_err(),
        LedgerError::NotFound(_)
    ));
}

#[test]
fn audit_worker_mirrors_a_depletion() {
    let (service, _, bus) = default_service();
    let audit_store = Arc::new(InMemoryAuditStore::new());
    let mirror = ChemicalAuditMirror::new(Arc::clone(&audit_store));
    let handle = AuditWorker::spawn(Arc::clone(&bus), mirror);

    let (item, lot_id) = seeded_chemical(&service, 20);
    issue(&service, &item, lot_id, -20);

    // The mirror is asynchronous; poll briefly.
    let deadline = Instant::now() + Duration::from_secs(5);
    let entries = loop {
        let entries = audit_store.for_item(item.id).unwrap();
        if entries.len() >= 2 || Instant::now() > deadline {
            break entries;
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    handle.shutdown();

    // Opening receipt (add) + depleting issue (deplete).
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, AuditAction::Add);
    assert_eq!(entries[1].action, AuditAction::Deplete);
    assert_eq!(entries[1].remaining, 0);
    assert_eq!(entries[1].lot_number, "LOT-A");
}

#[test]
fn concurrent_postings_conserve_quantity() {
    let initial: i64 = 10_000;
    let threads = 8;
    let per_thread = 25;
    let delta: i64 = -3;

    let (service, _, _) = service_with(LedgerConfig {
        negative_stock: NegativeStockPolicy::Reject,
        max_commit_retries: 100,
    });
    let (item, lot_id) = seeded_chemical(&service, initial);
    let service = Arc::new(service);

    let mut joins = Vec::new();
    for _ in 0..threads {
        let service = Arc::clone(&service);
        let item_id = item.id;
        joins.push(std::thread::spawn(move || {
            let mut committed = 0u32;
            for _ in 0..per_thread {
                let result = service.post(PostRequest::new(
                    TxnType::Issue,
                    vec![LineRequest {
                        item_id,
                        lot_id: Some(lot_id),
                        qty: delta,
                        unit_cost: None,
                    }],
                    test_actor(),
                ));
                match result {
                    Ok(_) => committed += 1,
                    Err(LedgerError::ConcurrencyConflict(_)) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
            committed
        }));
    }

    let committed: u32 = joins.into_iter().map(|j| j.join().unwrap()).sum();
    assert!(committed > 0);

    // Conservation: every committed delta applied exactly once.
    let final_item = service.get_item(item.id).unwrap();
    assert_eq!(final_item.on_hand, initial + delta * i64::from(committed));
    assert_eq!(final_item.on_hand, final_item.lot_sum());

    // Every committed transaction's snapshot chain is consistent with some
    // total order: sorting by sequence, each before matches the prior after.
    let mut listed = service
        .list_by_item(
            item.id,
            &TxnFilter {
                txn_type: Some(TxnType::Issue),
                ..TxnFilter::default()
            },
            Pagination::new(Some(1000), None),
        )
        .unwrap()
        .transactions;
    listed.sort_by_key(|t| t.sequence);
    let mut prior_after = initial;
    for txn in &listed {
        let line = &txn.lines[0];
        assert_eq!(line.lot_qty_before, Some(prior_after));
        prior_after = line.lot_qty_after.unwrap();
    }
    assert_eq!(prior_after, final_item.on_hand);
}
