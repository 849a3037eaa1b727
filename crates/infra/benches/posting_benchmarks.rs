//! Posting throughput benchmarks over the in-memory store.

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use lotledger_catalog::ItemType;
use lotledger_core::{Actor, ActorId, LotId};
use lotledger_events::{EventEnvelope, InMemoryEventBus};
use lotledger_infra::ledger_store::InMemoryLedgerStore;
use lotledger_infra::service::{LedgerConfig, LedgerService};
use lotledger_ledger::{LedgerEvent, LineRequest, PostRequest, TxnType};

type BenchService =
    LedgerService<Arc<InMemoryLedgerStore>, Arc<InMemoryEventBus<EventEnvelope<LedgerEvent>>>>;

fn bench_service() -> (BenchService, lotledger_core::ItemId, LotId) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let service = LedgerService::new(store, bus, LedgerConfig::default());

    let item = service
        .create_item("CHEM-001", "Acetone", ItemType::Chemical, "mL", vec![])
        .unwrap();
    let actor = Actor::new(ActorId::new(), "bench");
    let (item, _) = service
        .add_lot(item.id, "LOT-A", None, i64::MAX / 4, actor)
        .unwrap();
    let lot_id = item.lot_by_number("LOT-A").unwrap().id;
    (service, item.id, lot_id)
}

fn bench_post(c: &mut Criterion) {
    let (service, item_id, lot_id) = bench_service();
    let actor = Actor::new(ActorId::new(), "bench");

    c.bench_function("post_single_lot_issue", |b| {
        b.iter(|| {
            service
                .post(PostRequest::new(
                    TxnType::Issue,
                    vec![LineRequest {
                        item_id,
                        lot_id: Some(lot_id),
                        qty: -1,
                        unit_cost: Some(100),
                    }],
                    actor.clone(),
                ))
                .unwrap()
        })
    });
}

fn bench_post_and_reverse(c: &mut Criterion) {
    let (service, item_id, lot_id) = bench_service();
    let actor = Actor::new(ActorId::new(), "bench");

    c.bench_function("post_then_reverse", |b| {
        b.iter(|| {
            let outcome = service
                .post(PostRequest::new(
                    TxnType::Issue,
                    vec![LineRequest {
                        item_id,
                        lot_id: Some(lot_id),
                        qty: -1,
                        unit_cost: None,
                    }],
                    actor.clone(),
                ))
                .unwrap();
            service
                .reverse(outcome.txn.id, actor.clone(), "bench undo")
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_post, bench_post_and_reverse);
criterion_main!(benches);
