//! `lotledger-events` — event distribution mechanics.
//!
//! The ledger store is the source of truth; this crate only moves committed
//! facts to downstream consumers (the chemical audit mirror, future
//! projections). Delivery is at-least-once, so consumers must be idempotent.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
