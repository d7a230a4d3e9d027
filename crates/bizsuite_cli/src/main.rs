//! CLI smoke entry point.
//!
//! Boots the module catalog against the configured database, provisions a
//! demo tenant, creates a `staff` role and prints what it was granted.
//!
//! Usage: `bizsuite_cli [config.json] [enabled-modules]`

use bizsuite_core::event::domain::TenantProvisioned;
use bizsuite_core::{
    build_event_bus, init_logging_from, open_configured, open_db, CachedModuleRegistry,
    CoreConfig, DomainEvent, ModuleCatalog, ModuleRegistry, QueueWorker, RoleService,
    SetupStatus, SqlitePermissionStore, TenantService,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_MODULES: &str = "Hrm,Goal";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bizsuite_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().filter(|arg| !arg.is_empty()).map(PathBuf::from);
    let modules = args.next().unwrap_or_else(|| DEFAULT_MODULES.to_string());

    let config = CoreConfig::load(config_path.as_deref())?;
    init_logging_from(&config)?;

    let conn = open_configured(&config)?;
    let catalog = ModuleCatalog::with_builtin_modules()?;
    catalog.install_permissions(&conn)?;
    let registry = Arc::new(CachedModuleRegistry::load(&conn)?);
    let bus = build_event_bus(&catalog, Arc::clone(&registry) as Arc<dyn ModuleRegistry>)?;
    info!(
        "event=cli_boot module=cli status=ok version={} modules={}",
        bizsuite_core::core_version(),
        catalog.len()
    );

    let provisioning = TenantService::new(&conn, &bus, &registry).provision("Demo Co", &modules)?;
    let tenant = &provisioning.tenant;
    println!("tenant={} modules={}", tenant.uuid, tenant.modules.to_csv());
    print_setup("provision", &provisioning.setup);

    let created = RoleService::new(&conn, &bus).create_role(tenant.uuid, "staff")?;
    print_setup("role", &created.setup);
    for permission in SqlitePermissionStore::new(&conn).granted_permissions(created.role.uuid)? {
        println!("granted {permission}");
    }

    // Queued re-provisioning needs a file the worker can open on its own.
    if let Some(path) = config.database_path.clone() {
        let worker_bus = Arc::new(build_event_bus(&catalog, registry)?);
        let worker = QueueWorker::spawn(worker_bus, config.queue_capacity, move || open_db(path));
        worker.submit(DomainEvent::TenantProvisioned(TenantProvisioned {
            tenant_id: tenant.uuid,
            enabled_modules: tenant.modules.to_csv(),
        }))?;
        let summary = worker.shutdown()?;
        println!(
            "queue delivered={} faulted={}",
            summary.delivered, summary.faulted
        );
    }
    Ok(())
}

fn print_setup(step: &str, status: &SetupStatus) {
    match status {
        SetupStatus::Complete { changes } => println!("{step} setup=complete changes={changes}"),
        SetupStatus::Incomplete { failed_listeners } => {
            println!("{step} setup=incomplete failed={}", failed_listeners.join(","))
        }
    }
}
