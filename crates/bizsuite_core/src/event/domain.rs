//! Domain event records.

use crate::model::ledger::LedgerEntry;
use crate::model::role::RoleId;
use crate::model::tenant::TenantId;
use crate::module::id::ModuleSet;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Event kind used as the binding key on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RoleCreated,
    TenantProvisioned,
    LedgerEntryPosted,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoleCreated => "role_created",
            Self::TenantProvisioned => "tenant_provisioned",
            Self::LedgerEntryPosted => "ledger_entry_posted",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role was created in a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCreated {
    pub tenant_id: TenantId,
    pub role_id: RoleId,
    /// Absent when the host could not resolve the role name.
    pub role_name: Option<String>,
    /// Comma-joined module names enabled for the tenant.
    pub enabled_modules: String,
}

/// A tenant (company) was created, or its module plan changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantProvisioned {
    pub tenant_id: TenantId,
    pub enabled_modules: String,
}

/// A ledger line was posted by the accounting module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntryPosted {
    pub entry: LedgerEntry,
}

/// Broadcast message describing something that happened in the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    RoleCreated(RoleCreated),
    TenantProvisioned(TenantProvisioned),
    LedgerEntryPosted(LedgerEntryPosted),
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RoleCreated(_) => EventKind::RoleCreated,
            Self::TenantProvisioned(_) => EventKind::TenantProvisioned,
            Self::LedgerEntryPosted(_) => EventKind::LedgerEntryPosted,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        match self {
            Self::RoleCreated(event) => event.tenant_id,
            Self::TenantProvisioned(event) => event.tenant_id,
            Self::LedgerEntryPosted(event) => event.entry.tenant_uuid,
        }
    }

    /// Module set carried in the payload, when the event kind has one.
    ///
    /// Events without a list are gated through the module registry instead.
    pub fn enabled_modules(&self) -> Option<ModuleSet> {
        match self {
            Self::RoleCreated(event) => Some(ModuleSet::parse_csv(&event.enabled_modules)),
            Self::TenantProvisioned(event) => Some(ModuleSet::parse_csv(&event.enabled_modules)),
            Self::LedgerEntryPosted(_) => None,
        }
    }
}
