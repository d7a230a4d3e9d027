//! Tenant signup and module plan changes.

use crate::event::bus::EventBus;
use crate::event::domain::{DomainEvent, TenantProvisioned};
use crate::model::tenant::{TenantId, TenantRecord};
use crate::module::id::ModuleSet;
use crate::module::registry::CachedModuleRegistry;
use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::{publish_for_setup, SetupStatus};
use log::info;
use rusqlite::Connection;

/// Result of provisioning a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantProvisioning {
    pub tenant: TenantRecord,
    pub setup: SetupStatus,
}

/// Result of replacing a tenant's module set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleChange {
    pub modules: ModuleSet,
    /// Modules that were not active before the change.
    pub activated: ModuleSet,
    pub setup: SetupStatus,
}

pub struct TenantService<'a> {
    conn: &'a Connection,
    bus: &'a EventBus,
    registry: &'a CachedModuleRegistry,
}

impl<'a> TenantService<'a> {
    pub fn new(conn: &'a Connection, bus: &'a EventBus, registry: &'a CachedModuleRegistry) -> Self {
        Self {
            conn,
            bus,
            registry,
        }
    }

    /// Creates a tenant with the given comma-joined module list and runs
    /// module setup for it.
    pub fn provision(&self, name: &str, enabled_modules: &str) -> RepoResult<TenantProvisioning> {
        let tenant = TenantRecord::new(name.trim(), ModuleSet::parse_csv(enabled_modules));
        SqliteTenantRepository::new(self.conn).create_tenant(&tenant)?;
        self.registry
            .set_tenant_modules(tenant.uuid, tenant.modules.clone());
        info!(
            "event=tenant_provision module=service status=ok tenant={} modules={}",
            tenant.uuid,
            tenant.modules.to_csv()
        );

        let setup = self.announce(tenant.uuid, &tenant.modules);
        Ok(TenantProvisioning { tenant, setup })
    }

    /// Replaces the tenant's module set and re-runs provisioning so newly
    /// activated modules install their default data.
    pub fn change_modules(&self, tenant: TenantId, enabled_modules: &str) -> RepoResult<ModuleChange> {
        let repo = SqliteTenantRepository::new(self.conn);
        let previous = repo
            .get_tenant(tenant)?
            .ok_or_else(|| RepoError::NotFound(format!("tenant {tenant}")))?
            .modules;
        let modules = ModuleSet::parse_csv(enabled_modules);
        repo.replace_modules(tenant, &modules)?;
        self.registry.set_tenant_modules(tenant, modules.clone());

        let activated = modules.added_since(&previous);
        info!(
            "event=tenant_modules_change module=service status=ok tenant={} modules={} activated={}",
            tenant,
            modules.to_csv(),
            activated.to_csv()
        );

        let setup = self.announce(tenant, &modules);
        Ok(ModuleChange {
            modules,
            activated,
            setup,
        })
    }

    fn announce(&self, tenant: TenantId, modules: &ModuleSet) -> SetupStatus {
        let event = DomainEvent::TenantProvisioned(TenantProvisioned {
            tenant_id: tenant,
            enabled_modules: modules.to_csv(),
        });
        publish_for_setup(self.bus, self.conn, &event)
    }
}
