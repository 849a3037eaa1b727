use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use lotledger_events::{EventBus, EventEnvelope, Subscription};
use lotledger_ledger::LedgerEvent;

use crate::audit::{AuditStore, ChemicalAuditMirror};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Chemical audit worker: drains posted-transaction envelopes from a bus
/// subscription into the audit mirror.
///
/// The mirror is idempotent (sequence cursor), so at-least-once delivery is
/// safe. Handler failures are logged and skipped; the authoritative ledger
/// is already committed by the time an envelope reaches this worker.
#[derive(Debug)]
pub struct AuditWorker;

impl AuditWorker {
    pub fn spawn<B, S>(bus: B, mirror: ChemicalAuditMirror<S>) -> WorkerHandle
    where
        B: EventBus<EventEnvelope<LedgerEvent>> + Send + Sync + 'static,
        S: AuditStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<EventEnvelope<LedgerEvent>> = bus.subscribe();

        let join = thread::Builder::new()
            .name("chemical-audit-mirror".to_string())
            .spawn(move || worker_loop(sub, shutdown_rx, mirror))
            .expect("failed to spawn audit worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop<S>(
    sub: Subscription<EventEnvelope<LedgerEvent>>,
    shutdown_rx: mpsc::Receiver<()>,
    mirror: ChemicalAuditMirror<S>,
) where
    S: AuditStore,
{
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => {
                if let Err(err) = mirror.apply_envelope(&envelope) {
                    warn!(sequence = envelope.sequence(), error = ?err, "audit mirror failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
