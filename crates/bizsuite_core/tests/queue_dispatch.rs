use bizsuite_core::event::domain::TenantProvisioned;
use bizsuite_core::repo::seed_repo::{SeedRepository, SqliteSeedRepository};
use bizsuite_core::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use bizsuite_core::{
    build_event_bus, open_db, CachedModuleRegistry, DomainEvent, EventEnvelope, ModuleCatalog,
    ModuleId, ModuleSet, QueueError, QueueWorker, TenantRecord, WorkerSummary,
};
use std::sync::Arc;

#[test]
fn worker_publishes_on_its_own_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.sqlite3");
    let catalog = ModuleCatalog::with_builtin_modules().unwrap();

    let tenant = TenantRecord::new("Acme", ModuleSet::parse_csv("Taskly,Recruitment"));
    {
        let conn = open_db(&path).unwrap();
        catalog.install_permissions(&conn).unwrap();
        SqliteTenantRepository::new(&conn)
            .create_tenant(&tenant)
            .unwrap();
    }

    let registry = Arc::new(CachedModuleRegistry::new());
    let bus = Arc::new(build_event_bus(&catalog, registry).unwrap());
    let worker_path = path.clone();
    let worker = QueueWorker::spawn(bus, 8, move || open_db(worker_path));

    let event = DomainEvent::TenantProvisioned(TenantProvisioned {
        tenant_id: tenant.uuid,
        enabled_modules: tenant.modules.to_csv(),
    });
    let first = worker.submit(event.clone()).unwrap();
    let second = worker.submit(event).unwrap();
    assert_eq!(second, first + 1);

    let summary = worker.shutdown().unwrap();
    assert_eq!(
        summary,
        WorkerSummary {
            delivered: 2,
            faulted: 0,
        }
    );

    let conn = open_db(&path).unwrap();
    let seeds = SqliteSeedRepository::new(&conn);
    assert_eq!(seeds.count_for_module(tenant.uuid, ModuleId::Taskly).unwrap(), 4);
    assert_eq!(
        seeds.count_for_module(tenant.uuid, ModuleId::Recruitment).unwrap(),
        4
    );
    assert_eq!(seeds.count_for_module(tenant.uuid, ModuleId::Lead).unwrap(), 0);
}

#[test]
fn connect_failure_is_reported_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing").join("nested").join("db.sqlite3");
    let bus = Arc::new(bizsuite_core::EventBus::builder().build());

    let worker = QueueWorker::spawn(bus, 1, move || open_db(missing));

    assert!(matches!(worker.shutdown(), Err(QueueError::Connect(_))));
}

#[test]
fn envelope_serializes_with_tagged_event() {
    let envelope = EventEnvelope {
        sequence: 7,
        enqueued_at_ms: 1_700_000_000_000,
        event: DomainEvent::TenantProvisioned(TenantProvisioned {
            tenant_id: uuid::Uuid::nil(),
            enabled_modules: "Hrm".to_string(),
        }),
    };

    let json = serde_json::to_value(&envelope).unwrap();

    assert_eq!(json["sequence"], 7);
    assert_eq!(json["event"]["kind"], "tenant_provisioned");
    assert_eq!(json["event"]["enabled_modules"], "Hrm");
}

#[test]
fn zero_capacity_still_accepts_a_submission() {
    let bus = Arc::new(bizsuite_core::EventBus::builder().build());
    let worker = QueueWorker::spawn(bus, 0, bizsuite_core::open_db_in_memory);

    let event = DomainEvent::TenantProvisioned(TenantProvisioned {
        tenant_id: uuid::Uuid::new_v4(),
        enabled_modules: "Hrm".to_string(),
    });
    assert!(worker.submit(event).is_ok());

    assert_eq!(worker.shutdown().unwrap().delivered, 1);
}
