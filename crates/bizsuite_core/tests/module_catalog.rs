use bizsuite_core::module::manifest::MenuKind;
use bizsuite_core::{
    build_event_bus, open_db_in_memory, CachedModuleRegistry, ModuleCatalog, ModuleRegistry,
    RoleService, SqlitePermissionStore, TenantService,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn staff_navigation_reflects_active_modules_and_grants() {
    let conn = open_db_in_memory().unwrap();
    let catalog = ModuleCatalog::with_builtin_modules().unwrap();
    catalog.install_permissions(&conn).unwrap();
    let registry = Arc::new(CachedModuleRegistry::new());
    let bus = build_event_bus(&catalog, registry.clone()).unwrap();

    let tenant = TenantService::new(&conn, &bus, &registry)
        .provision("Acme", "Hrm,Goal")
        .unwrap()
        .tenant;
    let role = RoleService::new(&conn, &bus)
        .create_role(tenant.uuid, "staff")
        .unwrap()
        .role;
    let granted: BTreeSet<String> = SqlitePermissionStore::new(&conn)
        .granted_permissions(role.uuid)
        .unwrap()
        .into_iter()
        .collect();

    let links: Vec<&str> = catalog
        .menu_for(
            MenuKind::Navigation,
            &registry.active_modules(tenant.uuid),
            &granted,
        )
        .into_iter()
        .map(|item| item.link.as_str())
        .collect();

    assert_eq!(links, vec!["/goals", "/leaves", "/attendance"]);
    assert!(catalog
        .menu_for(MenuKind::Settings, &tenant.modules, &granted)
        .is_empty());
}

#[test]
fn warm_registry_matches_stored_tenants() {
    let conn = open_db_in_memory().unwrap();
    let catalog = ModuleCatalog::with_builtin_modules().unwrap();
    let live = Arc::new(CachedModuleRegistry::new());
    let bus = build_event_bus(&catalog, live.clone()).unwrap();
    let tenant = TenantService::new(&conn, &bus, &live)
        .provision("Acme", "Lead,ZoomMeeting")
        .unwrap()
        .tenant;

    let warmed = CachedModuleRegistry::load(&conn).unwrap();

    assert_eq!(warmed.active_modules(tenant.uuid), tenant.modules);
    assert_eq!(live.active_modules(tenant.uuid), tenant.modules);
}
