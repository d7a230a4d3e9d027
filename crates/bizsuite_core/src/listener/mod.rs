//! Module listeners: per-module reactions to domain events.
//!
//! # Responsibility
//! - Define the shared `Listener` contract used by the event bus.
//! - Gate every side effect behind the owning module's activation.
//!
//! # Invariants
//! - A listener whose module is inactive for the event's tenant performs no
//!   write and returns `ListenerOutcome::Skipped`.
//! - Listener writes are idempotent.

use crate::event::domain::DomainEvent;
use crate::module::id::ModuleId;
use crate::module::registry::ModuleRegistry;
use crate::repo::RepoError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod bindings;
pub mod default_data;
pub mod ledger_reaction;
pub mod role_provisioning;

pub use bindings::build_event_bus;
pub use default_data::DefaultDataListener;
pub use ledger_reaction::{
    BudgetSpendReaction, CrossModuleReactionListener, GoalContributionReaction, Reaction,
};
pub use role_provisioning::RoleProvisioningListener;

/// Per-delivery resources handed to listeners.
pub struct EventContext<'conn> {
    pub conn: &'conn Connection,
}

impl<'conn> EventContext<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

/// Why a listener did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Owning module is not active for the tenant.
    ModuleInactive,
    /// Event kind or payload has nothing for this listener.
    NotApplicable,
}

/// Result of one successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerOutcome {
    Skipped(SkipReason),
    /// Side effect ran; `changes` counts rows actually written.
    Applied { changes: usize },
}

/// Failure raised by one listener.
#[derive(Debug)]
pub enum ListenerError {
    Repo(RepoError),
    Rejected(String),
    Panicked(String),
}

impl Display for ListenerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "storage failure: {err}"),
            Self::Rejected(message) => write!(f, "rejected: {message}"),
            Self::Panicked(payload) => write!(f, "listener panicked: {payload}"),
        }
    }
}

impl Error for ListenerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Rejected(_) | Self::Panicked(_) => None,
        }
    }
}

impl From<RepoError> for ListenerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Handler bound to one or more event kinds on the bus.
pub trait Listener: Send + Sync {
    /// Stable name used in logs and fault reports.
    fn name(&self) -> &str;
    /// Owning module, when the listener belongs to one.
    fn module(&self) -> Option<ModuleId>;
    fn handle(
        &self,
        event: &DomainEvent,
        ctx: &EventContext<'_>,
    ) -> Result<ListenerOutcome, ListenerError>;
}

/// Activation gate shared by all module listeners.
///
/// Events that carry an enabled-module list are gated on that list; others
/// ask the registry about the event's tenant.
pub fn module_enabled_for(
    event: &DomainEvent,
    module: ModuleId,
    registry: &dyn ModuleRegistry,
) -> bool {
    match event.enabled_modules() {
        Some(modules) => modules.contains(module),
        None => registry.is_active(module, event.tenant_id()),
    }
}
