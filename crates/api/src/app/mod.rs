//! HTTP API application wiring (axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use lotledger_events::{EventEnvelope, InMemoryEventBus};
use lotledger_infra::audit::{ChemicalAuditMirror, InMemoryAuditStore};
use lotledger_infra::ledger_store::InMemoryLedgerStore;
use lotledger_infra::service::LedgerService;
use lotledger_infra::workers::{AuditWorker, WorkerHandle};
use lotledger_ledger::LedgerEvent;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

pub type ApiBus = Arc<InMemoryEventBus<EventEnvelope<LedgerEvent>>>;
pub type ApiService = LedgerService<Arc<InMemoryLedgerStore>, ApiBus>;

/// Shared application state.
pub struct AppState {
    pub service: ApiService,
    pub audit: Arc<InMemoryAuditStore>,
    /// Keeps the audit mirror draining the bus for the process lifetime.
    _audit_worker: WorkerHandle,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> Router {
    let store = Arc::new(InMemoryLedgerStore::new());
    let bus: ApiBus = Arc::new(InMemoryEventBus::new());
    let service = LedgerService::new(Arc::clone(&store), Arc::clone(&bus), config.ledger);

    let audit = Arc::new(InMemoryAuditStore::new());
    let mirror = ChemicalAuditMirror::new(Arc::clone(&audit));
    let audit_worker = AuditWorker::spawn(Arc::clone(&bus), mirror);

    let state = Arc::new(AppState {
        service,
        audit,
        _audit_worker: audit_worker,
    });

    // Protected routes: require a resolved actor context.
    let protected = routes::router()
        .layer(Extension(state))
        .layer(axum::middleware::from_fn(middleware::actor_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
