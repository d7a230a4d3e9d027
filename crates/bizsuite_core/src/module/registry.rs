//! Module activation registry.
//!
//! # Invariants
//! - `is_active` never fails: unknown tenants and unreadable state answer
//!   `false`.
//! - Lookups read an in-memory per-tenant cache; only explicit refresh calls
//!   touch storage.

use crate::model::tenant::TenantId;
use crate::module::id::{ModuleId, ModuleSet};
use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use crate::repo::RepoResult;
use log::{info, warn};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::RwLock;

/// Read-only activation lookup injected into listeners.
pub trait ModuleRegistry: Send + Sync {
    fn is_active(&self, module: ModuleId, tenant: TenantId) -> bool;
    /// Active modules for a tenant; empty for unknown tenants.
    fn active_modules(&self, tenant: TenantId) -> ModuleSet;
}

/// Registry backed by a cached per-tenant active-module set.
#[derive(Debug, Default)]
pub struct CachedModuleRegistry {
    tenants: RwLock<HashMap<TenantId, ModuleSet>>,
}

impl CachedModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry warmed with every tenant stored in `conn`.
    pub fn load(conn: &Connection) -> RepoResult<Self> {
        let registry = Self::new();
        registry.reload(conn)?;
        Ok(registry)
    }

    /// Replaces the whole cache from storage.
    pub fn reload(&self, conn: &Connection) -> RepoResult<usize> {
        let sets = SqliteTenantRepository::new(conn).list_module_sets()?;
        let count = sets.len();
        match self.tenants.write() {
            Ok(mut tenants) => {
                tenants.clear();
                tenants.extend(sets);
            }
            Err(poisoned) => {
                let mut tenants = poisoned.into_inner();
                tenants.clear();
                tenants.extend(sets);
                self.tenants.clear_poison();
            }
        }
        info!("event=registry_reload module=registry status=ok tenants={count}");
        Ok(count)
    }

    /// Sets the cached module set of one tenant.
    pub fn set_tenant_modules(&self, tenant: TenantId, modules: ModuleSet) {
        match self.tenants.write() {
            Ok(mut tenants) => {
                tenants.insert(tenant, modules);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(tenant, modules);
                self.tenants.clear_poison();
            }
        }
    }

    /// Drops one tenant from the cache; it reads as fully inactive afterwards.
    pub fn forget_tenant(&self, tenant: TenantId) {
        match self.tenants.write() {
            Ok(mut tenants) => {
                tenants.remove(&tenant);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&tenant);
                self.tenants.clear_poison();
            }
        }
    }

    /// Builds a registry from fixed activation sets, for hosts and tests that
    /// do not load tenants from storage.
    pub fn from_sets(sets: impl IntoIterator<Item = (TenantId, ModuleSet)>) -> Self {
        Self {
            tenants: RwLock::new(sets.into_iter().collect()),
        }
    }
}

impl ModuleRegistry for CachedModuleRegistry {
    fn is_active(&self, module: ModuleId, tenant: TenantId) -> bool {
        match self.tenants.read() {
            Ok(tenants) => tenants
                .get(&tenant)
                .is_some_and(|modules| modules.contains(module)),
            Err(_) => {
                warn!(
                    "event=registry_lookup module=registry status=error reason=lock_poisoned tenant={tenant}"
                );
                false
            }
        }
    }

    fn active_modules(&self, tenant: TenantId) -> ModuleSet {
        match self.tenants.read() {
            Ok(tenants) => tenants.get(&tenant).cloned().unwrap_or_default(),
            Err(_) => ModuleSet::new(),
        }
    }
}
