//! Synchronous in-process event bus.
//!
//! # Invariants
//! - Delivery order equals binding order for the event kind.
//! - Every bound listener sees each published event at most once.
//! - One listener's error or panic never stops delivery to the others;
//!   faults are aggregated and returned after the last listener ran.

use crate::event::domain::{DomainEvent, EventKind};
use crate::listener::{EventContext, Listener, ListenerError, ListenerOutcome};
use crate::logging::panic_payload_text;
use crate::module::id::ModuleId;
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Collects listener bindings before the bus is frozen.
#[derive(Default)]
pub struct EventBusBuilder {
    bindings: BTreeMap<EventKind, Vec<Arc<dyn Listener>>>,
}

impl EventBusBuilder {
    /// Appends `listener` to the delivery list of `kind`.
    pub fn bind(mut self, kind: EventKind, listener: Arc<dyn Listener>) -> Self {
        self.bindings.entry(kind).or_default().push(listener);
        self
    }

    pub fn build(self) -> EventBus {
        EventBus {
            bindings: self.bindings,
        }
    }
}

/// Immutable event-kind -> listener table with synchronous fan-out.
pub struct EventBus {
    bindings: BTreeMap<EventKind, Vec<Arc<dyn Listener>>>,
}

impl EventBus {
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// Number of listeners bound to `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.bindings.get(&kind).map_or(0, Vec::len)
    }

    /// Listener names bound to `kind`, in delivery order.
    pub fn listener_names(&self, kind: EventKind) -> Vec<&str> {
        self.bindings
            .get(&kind)
            .map(|listeners| listeners.iter().map(|listener| listener.name()).collect())
            .unwrap_or_default()
    }

    /// Delivers `event` to every bound listener in order.
    ///
    /// # Errors
    /// Returns `PublishError` when at least one listener failed. The error
    /// still carries the outcomes of the listeners that succeeded.
    pub fn publish(
        &self,
        event: &DomainEvent,
        ctx: &EventContext<'_>,
    ) -> Result<PublishReport, PublishError> {
        let started_at = Instant::now();
        let kind = event.kind();
        let tenant = event.tenant_id();
        let mut report = PublishReport {
            kind,
            deliveries: Vec::new(),
        };
        let mut faults = Vec::new();

        for listener in self.bindings.get(&kind).into_iter().flatten() {
            let result = catch_unwind(AssertUnwindSafe(|| listener.handle(event, ctx)))
                .unwrap_or_else(|payload| {
                    Err(ListenerError::Panicked(panic_payload_text(payload.as_ref())))
                });

            match result {
                Ok(outcome) => {
                    debug!(
                        "event=listener_delivery module=bus status=ok kind={} tenant={} listener={} outcome={:?}",
                        kind,
                        tenant,
                        listener.name(),
                        outcome
                    );
                    report.deliveries.push(Delivery {
                        listener: listener.name().to_string(),
                        outcome,
                    });
                }
                Err(err) => {
                    error!(
                        "event=listener_fault module=bus status=error kind={} tenant={} listener={} error={}",
                        kind,
                        tenant,
                        listener.name(),
                        err
                    );
                    faults.push(ListenerFault {
                        listener: listener.name().to_string(),
                        module: listener.module(),
                        error: err,
                    });
                }
            }
        }

        info!(
            "event=publish module=bus status={} kind={} tenant={} delivered={} faults={} duration_ms={}",
            if faults.is_empty() { "ok" } else { "error" },
            kind,
            tenant,
            report.deliveries.len(),
            faults.len(),
            started_at.elapsed().as_millis()
        );

        if faults.is_empty() {
            Ok(report)
        } else {
            Err(PublishError { report, faults })
        }
    }
}

/// Outcome of one successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub listener: String,
    pub outcome: ListenerOutcome,
}

/// Successful deliveries of one publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub kind: EventKind,
    pub deliveries: Vec<Delivery>,
}

impl PublishReport {
    /// Total rows written by all listeners.
    pub fn changes(&self) -> usize {
        self.deliveries
            .iter()
            .map(|delivery| match delivery.outcome {
                ListenerOutcome::Applied { changes } => changes,
                ListenerOutcome::Skipped(_) => 0,
            })
            .sum()
    }

    pub fn outcome_of(&self, listener: &str) -> Option<ListenerOutcome> {
        self.deliveries
            .iter()
            .find(|delivery| delivery.listener == listener)
            .map(|delivery| delivery.outcome)
    }
}

/// One failed delivery.
#[derive(Debug)]
pub struct ListenerFault {
    pub listener: String,
    pub module: Option<ModuleId>,
    pub error: ListenerError,
}

/// Aggregate failure of a publish call.
#[derive(Debug)]
pub struct PublishError {
    pub report: PublishReport,
    pub faults: Vec<ListenerFault>,
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names = self
            .faults
            .iter()
            .map(|fault| fault.listener.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "{} of {} listener(s) failed for {}: {}",
            self.faults.len(),
            self.faults.len() + self.report.deliveries.len(),
            self.report.kind,
            names
        )
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.faults
            .first()
            .map(|fault| &fault.error as &(dyn Error + 'static))
    }
}
