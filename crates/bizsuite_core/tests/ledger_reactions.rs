use bizsuite_core::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use bizsuite_core::{
    build_event_bus, open_db_in_memory, CachedModuleRegistry, EntrySide, EventBus, LedgerEntry,
    LedgerService, LedgerServiceError, ModuleCatalog, RepoError, SetupStatus, TenantId,
    TenantService,
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
    let registry = Arc::new(CachedModuleRegistry::load(&conn).unwrap());
    let bus = build_event_bus(&catalog, registry.clone()).unwrap();
    Host {
        conn,
        registry,
        bus,
    }
}

fn tenant_with(host: &Host, modules: &str) -> TenantId {
    let tenant = TenantService::new(&host.conn, &host.bus, &host.registry)
        .provision("Acme", modules)
        .unwrap()
        .tenant
        .uuid;
    let ledger = SqliteLedgerRepository::new(&host.conn);
    ledger.create_budget(tenant, "6000", 100_000).unwrap();
    ledger.create_goal(tenant, "3000", 5_000).unwrap();
    tenant
}

#[test]
fn debits_feed_budget_and_credits_feed_goal() {
    let host = boot();
    let tenant = tenant_with(&host, "Account,Budget,Goal");
    let service = LedgerService::new(&host.conn, &host.bus);

    let spend = service
        .post_entry(&LedgerEntry::new(tenant, "6000", EntrySide::Debit, 2_500))
        .unwrap();
    let saving = service
        .post_entry(&LedgerEntry::new(tenant, "3000", EntrySide::Credit, 5_000))
        .unwrap();
    service
        .post_entry(&LedgerEntry::new(tenant, "6000", EntrySide::Credit, 900))
        .unwrap();

    assert_eq!(spend.setup, SetupStatus::Complete { changes: 1 });
    assert_eq!(saving.setup, SetupStatus::Complete { changes: 1 });
    let ledger = SqliteLedgerRepository::new(&host.conn);
    assert_eq!(
        ledger.find_budget(tenant, "6000").unwrap().unwrap().spent_cents,
        2_500
    );
    let goal = ledger.find_goal(tenant, "3000").unwrap().unwrap();
    assert_eq!(goal.contributed_cents, 5_000);
    assert!(goal.is_reached());
}

#[test]
fn replaying_an_entry_never_double_counts() {
    let host = boot();
    let tenant = tenant_with(&host, "Budget");
    let service = LedgerService::new(&host.conn, &host.bus);
    let posting = service
        .post_entry(&LedgerEntry::new(tenant, "6000", EntrySide::Debit, 1_000))
        .unwrap();

    let replay = service.replay_entry(posting.entry_id).unwrap();

    assert_eq!(replay.setup, SetupStatus::Complete { changes: 0 });
    let budget = SqliteLedgerRepository::new(&host.conn)
        .find_budget(tenant, "6000")
        .unwrap()
        .unwrap();
    assert_eq!(budget.spent_cents, 1_000);
}

#[test]
fn consumers_follow_their_own_activation() {
    let host = boot();
    let tenant = tenant_with(&host, "Account,Goal");
    let service = LedgerService::new(&host.conn, &host.bus);

    service
        .post_entry(&LedgerEntry::new(tenant, "6000", EntrySide::Debit, 700))
        .unwrap();

    let budget = SqliteLedgerRepository::new(&host.conn)
        .find_budget(tenant, "6000")
        .unwrap()
        .unwrap();
    assert_eq!(budget.spent_cents, 0);
}

#[test]
fn invalid_entries_are_rejected_before_storage() {
    let host = boot();
    let tenant = tenant_with(&host, "Budget");
    let service = LedgerService::new(&host.conn, &host.bus);

    assert!(matches!(
        service.post_entry(&LedgerEntry::new(tenant, "6000", EntrySide::Debit, 0)),
        Err(LedgerServiceError::NonPositiveAmount(0))
    ));
    assert!(matches!(
        service.post_entry(&LedgerEntry::new(tenant, "  ", EntrySide::Debit, 10)),
        Err(LedgerServiceError::EmptyAccountCode)
    ));
    assert!(matches!(
        service.replay_entry(uuid::Uuid::new_v4()),
        Err(LedgerServiceError::Repo(RepoError::NotFound(_)))
    ));
}

#[test]
fn posting_inside_a_host_transaction_updates_budget_on_commit() {
    let mut host = boot();
    let tenant = tenant_with(&host, "Account,Budget");

    let tx = host.conn.transaction().unwrap();
    let posting = LedgerService::new(&tx, &host.bus)
        .post_entry(&LedgerEntry::new(tenant, "6000", EntrySide::Debit, 1_200))
        .unwrap();
    assert_eq!(posting.setup, SetupStatus::Complete { changes: 1 });
    tx.commit().unwrap();

    let budget = SqliteLedgerRepository::new(&host.conn)
        .find_budget(tenant, "6000")
        .unwrap()
        .unwrap();
    assert_eq!(budget.spent_cents, 1_200);
}
