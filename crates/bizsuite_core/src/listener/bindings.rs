//! Listener binding table: which listener each module contributes per event.

use crate::event::bus::EventBus;
use crate::event::domain::EventKind;
use crate::listener::default_data::DefaultDataListener;
use crate::listener::ledger_reaction::{
    BudgetSpendReaction, CrossModuleReactionListener, GoalContributionReaction,
};
use crate::listener::role_provisioning::RoleProvisioningListener;
use crate::listener::Listener;
use crate::module::catalog::{CatalogError, ModuleCatalog};
use crate::module::id::ModuleId;
use crate::module::manifest::ModuleManifest;
use crate::module::registry::ModuleRegistry;
use log::info;
use std::sync::Arc;

/// Builds the bus from every manifest's `listens_to` list.
///
/// Listeners for one event kind are bound in catalog registration order.
pub fn build_event_bus(
    catalog: &ModuleCatalog,
    registry: Arc<dyn ModuleRegistry>,
) -> Result<EventBus, CatalogError> {
    let mut builder = EventBus::builder();
    let mut bound = 0usize;
    for manifest in catalog.manifests() {
        for kind in &manifest.listens_to {
            let listener = listener_for(manifest, *kind, &registry)?;
            builder = builder.bind(*kind, listener);
            bound += 1;
        }
    }
    info!(
        "event=bus_build module=bindings status=ok modules={} listeners={}",
        catalog.len(),
        bound
    );
    Ok(builder.build())
}

fn listener_for(
    manifest: &ModuleManifest,
    kind: EventKind,
    registry: &Arc<dyn ModuleRegistry>,
) -> Result<Arc<dyn Listener>, CatalogError> {
    match kind {
        EventKind::RoleCreated => Ok(Arc::new(RoleProvisioningListener::new(
            manifest.id,
            manifest.fanout.clone(),
            Arc::clone(registry),
        ))),
        EventKind::TenantProvisioned => Ok(Arc::new(DefaultDataListener::new(
            manifest.id,
            manifest.seed_plan.clone(),
            Arc::clone(registry),
        ))),
        EventKind::LedgerEntryPosted => ledger_reaction(manifest.id, registry)
            .ok_or(CatalogError::UnsupportedBinding(manifest.id, kind)),
    }
}

/// Ledger consumers. Every module is listed so a new variant forces a
/// decision here.
fn ledger_reaction(
    module: ModuleId,
    registry: &Arc<dyn ModuleRegistry>,
) -> Option<Arc<dyn Listener>> {
    match module {
        ModuleId::Budget => Some(Arc::new(CrossModuleReactionListener::new(
            BudgetSpendReaction,
            Arc::clone(registry),
        ))),
        ModuleId::Goal => Some(Arc::new(CrossModuleReactionListener::new(
            GoalContributionReaction,
            Arc::clone(registry),
        ))),
        ModuleId::Account
        | ModuleId::Contract
        | ModuleId::Hrm
        | ModuleId::Lead
        | ModuleId::Recruitment
        | ModuleId::Taskly
        | ModuleId::ZoomMeeting => None,
    }
}

#[cfg(test)]
mod tests {
    use super::build_event_bus;
    use crate::event::domain::EventKind;
    use crate::module::builtin::builtin_manifest;
    use crate::module::catalog::{CatalogError, ModuleCatalog};
    use crate::module::id::ModuleId;
    use crate::module::registry::{CachedModuleRegistry, ModuleRegistry};
    use std::sync::Arc;

    fn registry() -> Arc<dyn ModuleRegistry> {
        Arc::new(CachedModuleRegistry::new())
    }

    #[test]
    fn builtin_catalog_binds_in_registration_order() {
        let catalog = ModuleCatalog::with_builtin_modules().unwrap();
        let bus = build_event_bus(&catalog, registry()).unwrap();

        assert_eq!(
            bus.listener_names(EventKind::LedgerEntryPosted),
            vec!["Budget.ledger_reaction", "Goal.ledger_reaction"]
        );
        assert_eq!(
            bus.listener_count(EventKind::RoleCreated),
            catalog
                .manifests()
                .filter(|manifest| manifest.listens_to.contains(&EventKind::RoleCreated))
                .count()
        );
        assert_eq!(
            bus.listener_names(EventKind::TenantProvisioned).first().copied(),
            Some("Account.default_data")
        );
    }

    #[test]
    fn ledger_binding_without_reaction_is_rejected() {
        let mut manifest = builtin_manifest(ModuleId::ZoomMeeting);
        manifest.listens_to.push(EventKind::LedgerEntryPosted);
        let mut catalog = ModuleCatalog::new();
        catalog.register(manifest).unwrap();

        let err = build_event_bus(&catalog, registry())
            .err()
            .expect("unsupported binding must fail");
        assert_eq!(
            err,
            CatalogError::UnsupportedBinding(ModuleId::ZoomMeeting, EventKind::LedgerEntryPosted)
        );
    }
}
