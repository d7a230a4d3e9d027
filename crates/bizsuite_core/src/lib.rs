//! Core of the BizSuite host: module activation, domain events, and the
//! listeners that propagate permissions and default data to tenants.

pub mod config;
pub mod db;
pub mod event;
pub mod listener;
pub mod logging;
pub mod model;
pub mod module;
pub mod permission;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_configured, open_db, open_db_in_memory, DbError, DbResult};
pub use event::{
    DomainEvent, EventBus, EventEnvelope, EventKind, PublishError, PublishReport, QueueError,
    QueueWorker, WorkerSummary,
};
pub use listener::{
    build_event_bus, EventContext, Listener, ListenerError, ListenerOutcome, SkipReason,
};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::ledger::{EntrySide, LedgerEntry};
pub use model::role::{RoleArchetype, RoleRecord};
pub use model::tenant::{TenantId, TenantRecord};
pub use module::{CachedModuleRegistry, CatalogError, ModuleCatalog, ModuleId, ModuleRegistry, ModuleSet};
pub use permission::{PermissionFanoutPolicy, PermissionStore, SqlitePermissionStore};
pub use repo::{RepoError, RepoResult};
pub use service::ledger_service::{LedgerService, LedgerServiceError};
pub use service::prompt_service::{PromptResolution, PromptService, PromptSource};
pub use service::role_service::{RoleCreation, RoleService};
pub use service::tenant_service::{ModuleChange, TenantProvisioning, TenantService};
pub use service::SetupStatus;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
