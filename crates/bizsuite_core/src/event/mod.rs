//! Domain events and their in-process delivery.
//!
//! # Invariants
//! - Events are immutable records; delivery concerns live in the bus and the
//!   queue envelope, never on the event itself.
//! - Listener bindings are fixed once the bus is built.

pub mod bus;
pub mod domain;
pub mod queue;

pub use bus::{Delivery, EventBus, EventBusBuilder, ListenerFault, PublishError, PublishReport};
pub use domain::{DomainEvent, EventKind, LedgerEntryPosted, RoleCreated, TenantProvisioned};
pub use queue::{EventEnvelope, QueueError, QueueWorker, WorkerSummary};
