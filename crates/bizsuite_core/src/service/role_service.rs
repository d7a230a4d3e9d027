//! Role creation.

use crate::event::bus::EventBus;
use crate::event::domain::{DomainEvent, RoleCreated};
use crate::model::role::RoleRecord;
use crate::model::tenant::TenantId;
use crate::repo::role_repo::{RoleRepository, SqliteRoleRepository};
use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::{publish_for_setup, SetupStatus};
use log::info;
use rusqlite::Connection;

/// Result of creating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCreation {
    pub role: RoleRecord,
    pub setup: SetupStatus,
}

pub struct RoleService<'a> {
    conn: &'a Connection,
    bus: &'a EventBus,
}

impl<'a> RoleService<'a> {
    pub fn new(conn: &'a Connection, bus: &'a EventBus) -> Self {
        Self { conn, bus }
    }

    /// Persists a role and hands it the default permissions of every module
    /// active for the tenant.
    ///
    /// # Errors
    /// - `NotFound` for an unknown tenant.
    /// - `Conflict` when the tenant already has a role with that name.
    pub fn create_role(&self, tenant: TenantId, name: &str) -> RepoResult<RoleCreation> {
        let record = SqliteTenantRepository::new(self.conn)
            .get_tenant(tenant)?
            .ok_or_else(|| RepoError::NotFound(format!("tenant {tenant}")))?;
        let roles = SqliteRoleRepository::new(self.conn);
        if let Some(existing) = roles.find_role_by_name(tenant, name)? {
            return Err(RepoError::Conflict(format!(
                "role `{}` in tenant {tenant}",
                existing.name
            )));
        }
        let role = RoleRecord::new(tenant, name.trim());
        roles.create_role(&role)?;
        info!(
            "event=role_create module=service status=ok tenant={} role={} name={}",
            tenant, role.uuid, role.name
        );

        let event = DomainEvent::RoleCreated(RoleCreated {
            tenant_id: tenant,
            role_id: role.uuid,
            role_name: Some(role.name.clone()),
            enabled_modules: record.modules.to_csv(),
        });
        let setup = publish_for_setup(self.bus, self.conn, &event);
        Ok(RoleCreation { role, setup })
    }
}
