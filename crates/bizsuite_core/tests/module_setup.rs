use bizsuite_core::event::domain::TenantProvisioned;
use bizsuite_core::listener::DefaultDataListener;
use bizsuite_core::module::builtin::{builtin_manifest, LEAD_SOURCE, LEAVE_TYPE, PIPELINE_STAGE};
use bizsuite_core::repo::seed_repo::{SeedRepository, SqliteSeedRepository};
use bizsuite_core::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use bizsuite_core::{
    build_event_bus, open_db_in_memory, CachedModuleRegistry, DomainEvent, EventBus, EventContext,
    EventKind, Listener, ListenerError, ListenerOutcome, ModuleCatalog, ModuleId, ModuleRegistry,
    ModuleSet, SetupStatus, SkipReason, TenantRecord, TenantService,
};
use rusqlite::Connection;
use std::sync::Arc;

struct Host {
    conn: Connection,
    registry: Arc<CachedModuleRegistry>,
    bus: EventBus,
}

fn boot() -> Host {
    let conn = open_db_in_memory().unwrap();
    let catalog = ModuleCatalog::with_builtin_modules().unwrap();
    catalog.install_permissions(&conn).unwrap();
    let registry = Arc::new(CachedModuleRegistry::new());
    let bus = build_event_bus(&catalog, registry.clone()).unwrap();
    Host {
        conn,
        registry,
        bus,
    }
}

fn seed_count(conn: &Connection, tenant: uuid::Uuid, module: ModuleId) -> u32 {
    SqliteSeedRepository::new(conn)
        .count_for_module(tenant, module)
        .unwrap()
}

#[test]
fn provisioning_twice_leaves_seed_count_unchanged() {
    let host = boot();
    let provisioning = TenantService::new(&host.conn, &host.bus, &host.registry)
        .provision("Acme", "Hrm,Lead")
        .unwrap();
    let tenant = provisioning.tenant.uuid;
    let leads_after_first = seed_count(&host.conn, tenant, ModuleId::Lead);
    assert_eq!(leads_after_first, 11);
    assert_eq!(seed_count(&host.conn, tenant, ModuleId::Hrm), 3);

    let again = DomainEvent::TenantProvisioned(TenantProvisioned {
        tenant_id: tenant,
        enabled_modules: "Hrm,Lead".to_string(),
    });
    let report = host
        .bus
        .publish(&again, &EventContext::new(&host.conn))
        .unwrap();

    assert_eq!(report.changes(), 0);
    assert_eq!(seed_count(&host.conn, tenant, ModuleId::Lead), leads_after_first);
    assert_eq!(
        SqliteSeedRepository::new(&host.conn)
            .list_names(tenant, PIPELINE_STAGE)
            .unwrap()
            .first()
            .map(String::as_str),
        Some("Draft")
    );
}

#[test]
fn inactive_lead_gets_no_sources_until_reactivated() {
    let host = boot();
    let tenants = TenantService::new(&host.conn, &host.bus, &host.registry);
    let tenant = tenants.provision("Acme", "Hrm").unwrap().tenant.uuid;
    let seeds = SqliteSeedRepository::new(&host.conn);

    assert!(seeds.list_names(tenant, LEAD_SOURCE).unwrap().is_empty());
    assert_eq!(seeds.list_names(tenant, LEAVE_TYPE).unwrap().len(), 3);

    let change = tenants.change_modules(tenant, "Hrm,Lead").unwrap();
    assert!(change.activated.contains(ModuleId::Lead));
    assert_eq!(change.activated.len(), 1);
    assert!(host.registry.is_active(ModuleId::Lead, tenant));
    let sources = seeds.list_names(tenant, LEAD_SOURCE).unwrap();
    assert_eq!(
        sources,
        vec!["Email", "Facebook", "Google", "Phone", "Website"]
    );

    let repeat = tenants.change_modules(tenant, "Hrm,Lead").unwrap();
    assert!(repeat.activated.is_empty());
    assert_eq!(repeat.setup, SetupStatus::Complete { changes: 0 });
    assert_eq!(seeds.list_names(tenant, LEAD_SOURCE).unwrap(), sources);
}

#[test]
fn deactivated_module_keeps_its_data_and_stops_reacting() {
    let host = boot();
    let tenants = TenantService::new(&host.conn, &host.bus, &host.registry);
    let tenant = tenants.provision("Acme", "Taskly,Hrm").unwrap().tenant.uuid;
    let stages = seed_count(&host.conn, tenant, ModuleId::Taskly);

    let change = tenants.change_modules(tenant, "Hrm").unwrap();

    assert!(!host.registry.is_active(ModuleId::Taskly, tenant));
    assert_eq!(change.modules, ModuleSet::parse_csv("Hrm"));
    assert_eq!(seed_count(&host.conn, tenant, ModuleId::Taskly), stages);
    let stored = SqliteTenantRepository::new(&host.conn)
        .get_tenant(tenant)
        .unwrap()
        .unwrap();
    assert_eq!(stored.modules.to_csv(), "Hrm");
}

#[test]
fn unknown_module_names_are_skipped_at_signup() {
    let host = boot();
    let provisioning = TenantService::new(&host.conn, &host.bus, &host.registry)
        .provision("Acme", "Hrm,Payroll, ,Lead")
        .unwrap();

    assert_eq!(provisioning.tenant.modules.to_csv(), "Hrm,Lead");
    assert!(provisioning.setup.is_complete());
}

struct AlwaysFails;

impl Listener for AlwaysFails {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn module(&self) -> Option<ModuleId> {
        None
    }

    fn handle(
        &self,
        _event: &DomainEvent,
        _ctx: &EventContext<'_>,
    ) -> Result<ListenerOutcome, ListenerError> {
        Err(ListenerError::Rejected("simulated outage".to_string()))
    }
}

struct Panics;

impl Listener for Panics {
    fn name(&self) -> &str {
        "panics"
    }

    fn module(&self) -> Option<ModuleId> {
        None
    }

    fn handle(
        &self,
        _event: &DomainEvent,
        _ctx: &EventContext<'_>,
    ) -> Result<ListenerOutcome, ListenerError> {
        panic!("listener bug");
    }
}

fn lead_bus(registry: Arc<dyn ModuleRegistry>) -> EventBus {
    let lead = builtin_manifest(ModuleId::Lead);
    EventBus::builder()
        .bind(EventKind::TenantProvisioned, Arc::new(AlwaysFails))
        .bind(EventKind::TenantProvisioned, Arc::new(Panics))
        .bind(
            EventKind::TenantProvisioned,
            Arc::new(DefaultDataListener::new(
                ModuleId::Lead,
                lead.seed_plan,
                registry,
            )),
        )
        .build()
}

#[test]
fn failing_listeners_do_not_block_their_siblings() {
    let conn = open_db_in_memory().unwrap();
    let tenant = TenantRecord::new("Acme", ModuleSet::parse_csv("Lead"));
    SqliteTenantRepository::new(&conn)
        .create_tenant(&tenant)
        .unwrap();
    let bus = lead_bus(Arc::new(CachedModuleRegistry::new()));
    let event = DomainEvent::TenantProvisioned(TenantProvisioned {
        tenant_id: tenant.uuid,
        enabled_modules: "Lead".to_string(),
    });

    let err = bus
        .publish(&event, &EventContext::new(&conn))
        .expect_err("two listeners fail");

    assert_eq!(err.faults.len(), 2);
    assert_eq!(err.faults[0].listener, "always_fails");
    assert!(matches!(err.faults[1].error, ListenerError::Panicked(_)));
    assert_eq!(
        err.report.outcome_of("Lead.default_data"),
        Some(ListenerOutcome::Applied { changes: 11 })
    );
    assert_eq!(seed_count(&conn, tenant.uuid, ModuleId::Lead), 11);
}

#[test]
fn listener_failure_degrades_signup_to_incomplete_setup() {
    let conn = open_db_in_memory().unwrap();
    let registry = Arc::new(CachedModuleRegistry::new());
    let bus = lead_bus(registry.clone());

    let provisioning = TenantService::new(&conn, &bus, &registry)
        .provision("Acme", "Lead")
        .unwrap();

    assert_eq!(
        provisioning.setup,
        SetupStatus::Incomplete {
            failed_listeners: vec!["always_fails".to_string(), "panics".to_string()],
        }
    );
    assert!(SqliteTenantRepository::new(&conn)
        .get_tenant(provisioning.tenant.uuid)
        .unwrap()
        .is_some());
    assert_eq!(seed_count(&conn, provisioning.tenant.uuid, ModuleId::Lead), 11);
}

#[test]
fn listener_skips_event_kinds_it_does_not_handle() {
    let registry: Arc<dyn ModuleRegistry> = Arc::new(CachedModuleRegistry::new());
    let listener = DefaultDataListener::new(
        ModuleId::Lead,
        builtin_manifest(ModuleId::Lead).seed_plan,
        registry,
    );
    let conn = open_db_in_memory().unwrap();
    let event = DomainEvent::RoleCreated(bizsuite_core::event::domain::RoleCreated {
        tenant_id: uuid::Uuid::new_v4(),
        role_id: uuid::Uuid::new_v4(),
        role_name: Some("staff".to_string()),
        enabled_modules: "Lead".to_string(),
    });

    assert_eq!(
        listener.handle(&event, &EventContext::new(&conn)).unwrap(),
        ListenerOutcome::Skipped(SkipReason::NotApplicable)
    );
}

#[test]
fn provisioning_inside_a_host_transaction_seeds_and_rolls_back_with_it() {
    let mut host = boot();
    let tenant = TenantRecord::new("Acme", ModuleSet::parse_csv("Lead"));
    let event = DomainEvent::TenantProvisioned(TenantProvisioned {
        tenant_id: tenant.uuid,
        enabled_modules: "Lead".to_string(),
    });

    let tx = host.conn.transaction().unwrap();
    SqliteTenantRepository::new(&tx)
        .create_tenant(&tenant)
        .unwrap();
    let report = host.bus.publish(&event, &EventContext::new(&tx)).unwrap();
    assert_eq!(
        report.outcome_of("Lead.default_data"),
        Some(ListenerOutcome::Applied { changes: 11 })
    );
    assert_eq!(seed_count(&tx, tenant.uuid, ModuleId::Lead), 11);
    tx.rollback().unwrap();
    assert_eq!(seed_count(&host.conn, tenant.uuid, ModuleId::Lead), 0);

    let tx = host.conn.transaction().unwrap();
    SqliteTenantRepository::new(&tx)
        .create_tenant(&tenant)
        .unwrap();
    host.bus.publish(&event, &EventContext::new(&tx)).unwrap();
    tx.commit().unwrap();
    assert_eq!(seed_count(&host.conn, tenant.uuid, ModuleId::Lead), 11);
}
