//! Use-case services: the host actions that emit domain events.
//!
//! # Invariants
//! - A primary action (tenant signup, role creation, ledger posting) is
//!   committed before its event is published.
//! - Listener faults never turn a committed primary action into an error;
//!   they surface as [`SetupStatus::Incomplete`].

use crate::event::bus::{EventBus, PublishReport};
use crate::event::domain::DomainEvent;
use crate::listener::EventContext;
use log::warn;
use rusqlite::Connection;

pub mod ledger_service;
pub mod prompt_service;
pub mod role_service;
pub mod tenant_service;

/// Whether every module listener finished its setup work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStatus {
    Complete { changes: usize },
    /// Named listeners failed; the rest ran to completion.
    Incomplete { failed_listeners: Vec<String> },
}

impl SetupStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

pub(crate) fn publish_for_setup(
    bus: &EventBus,
    conn: &Connection,
    event: &DomainEvent,
) -> SetupStatus {
    match bus.publish(event, &EventContext::new(conn)) {
        Ok(report) => complete(&report),
        Err(err) => {
            warn!(
                "event=module_setup module=service status=error kind={} tenant={} error={}",
                event.kind(),
                event.tenant_id(),
                err
            );
            SetupStatus::Incomplete {
                failed_listeners: err
                    .faults
                    .iter()
                    .map(|fault| fault.listener.clone())
                    .collect(),
            }
        }
    }
}

fn complete(report: &PublishReport) -> SetupStatus {
    SetupStatus::Complete {
        changes: report.changes(),
    }
}
