//! Tenant (company) records.

use crate::module::id::ModuleSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one tenant account.
pub type TenantId = Uuid;

/// Persisted tenant with its active module set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub uuid: TenantId,
    pub name: String,
    pub modules: ModuleSet,
}

impl TenantRecord {
    /// Creates a tenant with a generated id.
    pub fn new(name: impl Into<String>, modules: ModuleSet) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            modules,
        }
    }
}
