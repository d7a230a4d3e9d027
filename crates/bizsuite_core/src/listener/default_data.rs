//! Installs a module's default records when a tenant is provisioned.

use crate::event::domain::DomainEvent;
use crate::listener::{
    module_enabled_for, EventContext, Listener, ListenerError, ListenerOutcome, SkipReason,
};
use crate::module::id::ModuleId;
use crate::module::manifest::SeedPlan;
use crate::module::registry::ModuleRegistry;
use crate::repo::seed_repo::{SeedRepository, SeedRow, SqliteSeedRepository};
use crate::repo::WriteScope;
use log::{debug, info};
use std::sync::Arc;

/// `TenantProvisioned` listener writing one module's seed plan.
///
/// Re-running is safe: rows already present for the tenant are left alone,
/// so only missing rows are written.
pub struct DefaultDataListener {
    module: ModuleId,
    name: String,
    plan: SeedPlan,
    registry: Arc<dyn ModuleRegistry>,
}

impl DefaultDataListener {
    pub fn new(module: ModuleId, plan: SeedPlan, registry: Arc<dyn ModuleRegistry>) -> Self {
        Self {
            module,
            name: format!("{module}.default_data"),
            plan,
            registry,
        }
    }
}

impl Listener for DefaultDataListener {
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
        let DomainEvent::TenantProvisioned(provisioned) = event else {
            return Ok(ListenerOutcome::Skipped(SkipReason::NotApplicable));
        };
        if !module_enabled_for(event, self.module, self.registry.as_ref()) {
            debug!(
                "event=default_data module={} status=skip reason=inactive tenant={}",
                self.module, provisioned.tenant_id
            );
            return Ok(ListenerOutcome::Skipped(SkipReason::ModuleInactive));
        }

        let repo = SqliteSeedRepository::new(ctx.conn);
        let scope = WriteScope::begin(ctx.conn)?;
        let mut inserted = 0;
        for set in &self.plan.sets {
            for (position, name) in set.names.iter().enumerate() {
                let row = SeedRow {
                    module: self.module,
                    kind: set.kind.clone(),
                    name: name.clone(),
                    position: position as u32,
                };
                if repo.insert_if_absent(provisioned.tenant_id, &row)? {
                    inserted += 1;
                }
            }
        }
        scope.commit()?;

        info!(
            "event=default_data module={} status=ok tenant={} inserted={} planned={}",
            self.module,
            provisioned.tenant_id,
            inserted,
            self.plan.record_count()
        );
        Ok(ListenerOutcome::Applied { changes: inserted })
    }
}
