//! Grants a module's default permissions to newly created archetype roles.

use crate::event::domain::DomainEvent;
use crate::listener::{
    module_enabled_for, EventContext, Listener, ListenerError, ListenerOutcome, SkipReason,
};
use crate::module::id::ModuleId;
use crate::module::registry::ModuleRegistry;
use crate::permission::policy::{fan_out, PermissionFanoutPolicy};
use crate::permission::store::SqlitePermissionStore;
use log::{debug, info};
use std::sync::Arc;

/// `RoleCreated` listener interpreting one module's fan-out policies.
pub struct RoleProvisioningListener {
    module: ModuleId,
    name: String,
    policies: Vec<PermissionFanoutPolicy>,
    registry: Arc<dyn ModuleRegistry>,
}

impl RoleProvisioningListener {
    pub fn new(
        module: ModuleId,
        policies: Vec<PermissionFanoutPolicy>,
        registry: Arc<dyn ModuleRegistry>,
    ) -> Self {
        Self {
            module,
            name: format!("{module}.role_provisioning"),
            policies,
            registry,
        }
    }
}

impl Listener for RoleProvisioningListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn module(&self) -> Option<ModuleId> {
        Some(self.module)
    }

    fn handle(
        &self,
        event: &DomainEvent,
        ctx: &EventContext<'_>,
    ) -> Result<ListenerOutcome, ListenerError> {
        let DomainEvent::RoleCreated(created) = event else {
            return Ok(ListenerOutcome::Skipped(SkipReason::NotApplicable));
        };
        if !module_enabled_for(event, self.module, self.registry.as_ref()) {
            debug!(
                "event=role_provisioning module={} status=skip reason=inactive tenant={}",
                self.module, created.tenant_id
            );
            return Ok(ListenerOutcome::Skipped(SkipReason::ModuleInactive));
        }

        let role_name = created.role_name.as_deref();
        if !self.policies.iter().any(|policy| policy.applies_to(role_name)) {
            return Ok(ListenerOutcome::Skipped(SkipReason::NotApplicable));
        }

        let store = SqlitePermissionStore::new(ctx.conn);
        let report = fan_out(
            &store,
            self.module,
            &self.policies,
            created.role_id,
            role_name,
        )?;
        info!(
            "event=role_provisioning module={} status=ok role={} granted={} held={} skipped={}",
            self.module,
            created.role_id,
            report.granted.len(),
            report.already_held.len(),
            report.skipped_unknown.len()
        );
        Ok(ListenerOutcome::Applied {
            changes: report.changed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RoleProvisioningListener;
    use crate::db::open_db_in_memory;
    use crate::event::domain::{DomainEvent, RoleCreated};
    use crate::listener::{EventContext, Listener, ListenerOutcome, SkipReason};
    use crate::model::role::{RoleArchetype, RoleRecord};
    use crate::model::tenant::TenantRecord;
    use crate::module::id::{ModuleId, ModuleSet};
    use crate::module::registry::CachedModuleRegistry;
    use crate::permission::policy::PermissionFanoutPolicy;
    use crate::permission::store::SqlitePermissionStore;
    use crate::repo::role_repo::{RoleRepository, SqliteRoleRepository};
    use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
    use rusqlite::Connection;
    use std::sync::Arc;

    fn seeded(conn: &Connection, role_name: &str) -> RoleRecord {
        let tenant = TenantRecord::new("Acme", ModuleSet::parse_csv("ZoomMeeting"));
        SqliteTenantRepository::new(conn)
            .create_tenant(&tenant)
            .unwrap();
        let role = RoleRecord::new(tenant.uuid, role_name);
        SqliteRoleRepository::new(conn).create_role(&role).unwrap();
        let store = SqlitePermissionStore::new(conn);
        store
            .register("manage-zoom-meetings", ModuleId::ZoomMeeting)
            .unwrap();
        role
    }

    fn listener() -> RoleProvisioningListener {
        RoleProvisioningListener::new(
            ModuleId::ZoomMeeting,
            vec![PermissionFanoutPolicy::new(
                &[RoleArchetype::Staff, RoleArchetype::Client],
                &["manage-zoom-meetings"],
            )],
            Arc::new(CachedModuleRegistry::new()),
        )
    }

    fn created(role: &RoleRecord, name: Option<&str>, modules: &str) -> DomainEvent {
        DomainEvent::RoleCreated(RoleCreated {
            tenant_id: role.tenant_uuid,
            role_id: role.uuid,
            role_name: name.map(str::to_string),
            enabled_modules: modules.to_string(),
        })
    }

    #[test]
    fn grants_once_and_then_reports_no_change() {
        let conn = open_db_in_memory().unwrap();
        let role = seeded(&conn, "client");
        let ctx = EventContext::new(&conn);
        let event = created(&role, Some("client"), "Hrm,ZoomMeeting");

        let first = listener().handle(&event, &ctx).unwrap();
        let second = listener().handle(&event, &ctx).unwrap();

        assert_eq!(first, ListenerOutcome::Applied { changes: 1 });
        assert_eq!(second, ListenerOutcome::Applied { changes: 0 });
        assert_eq!(
            SqlitePermissionStore::new(&conn)
                .granted_permissions(role.uuid)
                .unwrap(),
            vec!["manage-zoom-meetings"]
        );
    }

    #[test]
    fn skips_when_module_not_in_payload_list() {
        let conn = open_db_in_memory().unwrap();
        let role = seeded(&conn, "staff");
        let event = created(&role, Some("staff"), "Hrm");

        let outcome = listener()
            .handle(&event, &EventContext::new(&conn))
            .unwrap();

        assert_eq!(outcome, ListenerOutcome::Skipped(SkipReason::ModuleInactive));
        assert!(SqlitePermissionStore::new(&conn)
            .granted_permissions(role.uuid)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_or_custom_role_name_is_not_applicable() {
        let conn = open_db_in_memory().unwrap();
        let role = seeded(&conn, "accountant");
        let ctx = EventContext::new(&conn);

        for name in [None, Some("accountant")] {
            let outcome = listener()
                .handle(&created(&role, name, "ZoomMeeting"), &ctx)
                .unwrap();
            assert_eq!(outcome, ListenerOutcome::Skipped(SkipReason::NotApplicable));
        }
    }
}
