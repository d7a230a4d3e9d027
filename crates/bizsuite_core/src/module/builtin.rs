//! Manifests of the modules shipped with the host.

use crate::event::domain::EventKind;
use crate::model::role::RoleArchetype;
use crate::module::id::ModuleId;
use crate::module::manifest::{HttpMethod, MenuItem, ModuleManifest, RouteDecl, SeedPlan};
use crate::permission::policy::PermissionFanoutPolicy;

pub const LEAVE_TYPE: &str = "leave_type";
pub const LEAD_SOURCE: &str = "lead_source";
pub const PIPELINE_STAGE: &str = "pipeline_stage";
pub const TASK_STAGE: &str = "task_stage";
pub const JOB_CATEGORY: &str = "job_category";
pub const CHART_OF_ACCOUNT: &str = "chart_of_account";

use HttpMethod::{Delete, Get, Post, Put};
use RoleArchetype::{Client, Staff, Vendor};

/// Built-in manifests in registration order.
pub fn builtin_manifests() -> Vec<ModuleManifest> {
    ModuleId::ALL.into_iter().map(builtin_manifest).collect()
}

/// Manifest of one built-in module.
pub fn builtin_manifest(module: ModuleId) -> ModuleManifest {
    match module {
        ModuleId::Account => account(),
        ModuleId::Budget => budget(),
        ModuleId::Contract => contract(),
        ModuleId::Goal => goal(),
        ModuleId::Hrm => hrm(),
        ModuleId::Lead => lead(),
        ModuleId::Recruitment => recruitment(),
        ModuleId::Taskly => taskly(),
        ModuleId::ZoomMeeting => zoom_meeting(),
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn account() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Account, "1.3.0");
    manifest.routes = vec![
        RouteDecl::new(Get, "/chart-of-accounts", Some("manage-chart-of-account")),
        RouteDecl::new(Post, "/chart-of-accounts", Some("create-chart-of-account")),
        RouteDecl::new(Get, "/journal-entries", Some("manage-journal-entry")),
        RouteDecl::new(Post, "/journal-entries", Some("create-journal-entry")),
        RouteDecl::new(Get, "/bills", Some("manage-bill")),
        RouteDecl::new(Get, "/reports/ledger", Some("show-ledger-report")),
    ];
    manifest.migrations = names(&["0001_create_chart_of_accounts", "0002_create_journal_entries"]);
    manifest.permissions = names(&[
        "manage-chart-of-account",
        "create-chart-of-account",
        "manage-journal-entry",
        "create-journal-entry",
        "manage-bill",
        "show-ledger-report",
    ]);
    manifest.fanout = vec![
        PermissionFanoutPolicy::new(&[Staff], &["manage-journal-entry"]),
        PermissionFanoutPolicy::new(&[Vendor], &["manage-bill"]),
    ];
    manifest.seed_plan = SeedPlan::default().with_set(
        CHART_OF_ACCOUNT,
        &[
            "1000 Cash",
            "1100 Accounts Receivable",
            "2000 Accounts Payable",
            "3000 Owner Equity",
            "4000 Sales Income",
            "5000 Cost of Sales",
            "6000 Operating Expenses",
        ],
    );
    manifest.listens_to = vec![EventKind::RoleCreated, EventKind::TenantProvisioned];
    manifest.settings_menu = vec![MenuItem::new(
        "Accounting",
        "/settings/accounting",
        Some("manage-chart-of-account"),
        "calculator",
    )];
    manifest.nav_menu = vec![
        MenuItem::new(
            "Chart of Accounts",
            "/chart-of-accounts",
            Some("manage-chart-of-account"),
            "list-details",
        ),
        MenuItem::new(
            "Journal Entries",
            "/journal-entries",
            Some("manage-journal-entry"),
            "notebook",
        ),
        MenuItem::new("Ledger Report", "/reports/ledger", Some("show-ledger-report"), "report"),
    ];
    manifest
}

fn budget() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Budget, "1.0.2");
    manifest.routes = vec![
        RouteDecl::new(Get, "/budgets", Some("manage-budget")),
        RouteDecl::new(Post, "/budgets", Some("create-budget")),
        RouteDecl::new(Put, "/budgets/{id}", Some("edit-budget")),
        RouteDecl::new(Delete, "/budgets/{id}", Some("delete-budget")),
    ];
    manifest.migrations = names(&["0001_create_budgets"]);
    manifest.permissions = names(&["manage-budget", "create-budget", "edit-budget", "delete-budget"]);
    manifest.fanout = vec![PermissionFanoutPolicy::new(&[Staff], &["manage-budget"])];
    manifest.listens_to = vec![EventKind::RoleCreated, EventKind::LedgerEntryPosted];
    manifest.nav_menu = vec![MenuItem::new(
        "Budget Planner",
        "/budgets",
        Some("manage-budget"),
        "chart-pie",
    )];
    manifest
}

fn contract() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Contract, "2.0.0");
    manifest.routes = vec![
        RouteDecl::new(Get, "/contracts", Some("manage-contract")),
        RouteDecl::new(Post, "/contracts", Some("create-contract")),
        RouteDecl::new(Get, "/contracts/{id}", Some("show-contract")),
    ];
    manifest.migrations = names(&["0001_create_contracts", "0002_create_contract_types"]);
    manifest.permissions = names(&[
        "manage-contract",
        "create-contract",
        "show-contract",
        "manage-contract-type",
    ]);
    manifest.fanout = vec![PermissionFanoutPolicy::new(
        &[Staff, Client],
        &["manage-contract", "show-contract"],
    )];
    manifest.listens_to = vec![EventKind::RoleCreated];
    manifest.settings_menu = vec![MenuItem::new(
        "Contract Types",
        "/settings/contract-types",
        Some("manage-contract-type"),
        "file-certificate",
    )];
    manifest.nav_menu = vec![MenuItem::new(
        "Contracts",
        "/contracts",
        Some("manage-contract"),
        "device-floppy",
    )];
    manifest
}

fn goal() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Goal, "1.1.0");
    manifest.routes = vec![
        RouteDecl::new(Get, "/goals", Some("manage-goal")),
        RouteDecl::new(Post, "/goals", Some("create-goal")),
        RouteDecl::new(Get, "/goals/{id}", Some("show-goal")),
    ];
    manifest.migrations = names(&["0001_create_goals"]);
    manifest.permissions = names(&["manage-goal", "create-goal", "show-goal"]);
    manifest.fanout = vec![PermissionFanoutPolicy::new(&[Staff], &["manage-goal", "show-goal"])];
    manifest.listens_to = vec![EventKind::RoleCreated, EventKind::LedgerEntryPosted];
    manifest.nav_menu = vec![MenuItem::new(
        "Financial Goals",
        "/goals",
        Some("manage-goal"),
        "target",
    )];
    manifest
}

fn hrm() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Hrm, "3.2.1");
    manifest.routes = vec![
        RouteDecl::new(Get, "/employees", Some("manage-employee")),
        RouteDecl::new(Post, "/employees", Some("create-employee")),
        RouteDecl::new(Get, "/leaves", Some("manage-leave")),
        RouteDecl::new(Post, "/leaves", Some("create-leave")),
        RouteDecl::new(Get, "/attendance", Some("manage-attendance")),
    ];
    manifest.migrations = names(&[
        "0001_create_employees",
        "0002_create_leave_types",
        "0003_create_attendance",
    ]);
    manifest.permissions = names(&[
        "manage-employee",
        "create-employee",
        "manage-leave",
        "create-leave",
        "manage-leave-type",
        "manage-attendance",
    ]);
    manifest.fanout = vec![PermissionFanoutPolicy::new(
        &[Staff],
        &["manage-leave", "create-leave", "manage-attendance"],
    )];
    manifest.seed_plan = SeedPlan::default().with_set(
        LEAVE_TYPE,
        &["Casual Leave", "Medical Leave", "Annual Leave"],
    );
    manifest.listens_to = vec![EventKind::RoleCreated, EventKind::TenantProvisioned];
    manifest.settings_menu = vec![MenuItem::new(
        "Leave Types",
        "/settings/leave-types",
        Some("manage-leave-type"),
        "calendar-off",
    )];
    manifest.nav_menu = vec![
        MenuItem::new("Employees", "/employees", Some("manage-employee"), "users"),
        MenuItem::new("Leave", "/leaves", Some("manage-leave"), "calendar-event"),
        MenuItem::new("Attendance", "/attendance", Some("manage-attendance"), "clock"),
    ];
    manifest
}

fn lead() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Lead, "2.4.0");
    manifest.routes = vec![
        RouteDecl::new(Get, "/leads", Some("manage-lead")),
        RouteDecl::new(Post, "/leads", Some("create-lead")),
        RouteDecl::new(Get, "/leads/{id}", Some("show-lead")),
        RouteDecl::new(Get, "/pipelines", Some("manage-pipeline")),
    ];
    manifest.migrations = names(&[
        "0001_create_leads",
        "0002_create_pipelines",
        "0003_create_lead_sources",
    ]);
    manifest.permissions = names(&[
        "manage-lead",
        "create-lead",
        "show-lead",
        "manage-pipeline",
        "manage-lead-source",
    ]);
    manifest.fanout = vec![PermissionFanoutPolicy::new(&[Staff], &["manage-lead", "show-lead"])];
    manifest.seed_plan = SeedPlan::default()
        .with_set(
            LEAD_SOURCE,
            &["Email", "Facebook", "Google", "Phone", "Website"],
        )
        .with_set(
            PIPELINE_STAGE,
            &["Draft", "Sent", "Open", "Revised", "Declined", "Accepted"],
        );
    manifest.listens_to = vec![EventKind::RoleCreated, EventKind::TenantProvisioned];
    manifest.settings_menu = vec![
        MenuItem::new(
            "Lead Sources",
            "/settings/lead-sources",
            Some("manage-lead-source"),
            "source-code",
        ),
        MenuItem::new(
            "Pipelines",
            "/settings/pipelines",
            Some("manage-pipeline"),
            "git-merge",
        ),
    ];
    manifest.nav_menu = vec![MenuItem::new("Leads", "/leads", Some("manage-lead"), "user-plus")];
    manifest
}

fn recruitment() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Recruitment, "1.5.0");
    manifest.routes = vec![
        RouteDecl::new(Get, "/jobs", Some("manage-job")),
        RouteDecl::new(Post, "/jobs", Some("create-job")),
        RouteDecl::new(Get, "/jobs/{id}", Some("show-job")),
        RouteDecl::new(Get, "/job-applications", Some("manage-job-application")),
        RouteDecl::new(Get, "/careers", None),
    ];
    manifest.migrations = names(&["0001_create_jobs", "0002_create_job_applications"]);
    manifest.permissions = names(&[
        "manage-job",
        "create-job",
        "show-job",
        "manage-job-application",
        "manage-job-category",
    ]);
    manifest.fanout = vec![PermissionFanoutPolicy::new(&[Staff], &["manage-job", "show-job"])];
    manifest.seed_plan = SeedPlan::default().with_set(
        JOB_CATEGORY,
        &["Engineering", "Sales", "Marketing", "Operations"],
    );
    manifest.listens_to = vec![EventKind::RoleCreated, EventKind::TenantProvisioned];
    manifest.settings_menu = vec![MenuItem::new(
        "Job Categories",
        "/settings/job-categories",
        Some("manage-job-category"),
        "category",
    )];
    manifest.nav_menu = vec![
        MenuItem::new("Jobs", "/jobs", Some("manage-job"), "briefcase"),
        MenuItem::new(
            "Applications",
            "/job-applications",
            Some("manage-job-application"),
            "file-text",
        ),
        MenuItem::new("Career Page", "/careers", None, "world"),
    ];
    manifest
}

fn taskly() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::Taskly, "4.0.0");
    manifest.routes = vec![
        RouteDecl::new(Get, "/projects", Some("manage-project")),
        RouteDecl::new(Post, "/projects", Some("create-project")),
        RouteDecl::new(Get, "/projects/{id}", Some("show-project")),
        RouteDecl::new(Get, "/projects/{id}/tasks", Some("manage-task")),
    ];
    manifest.migrations = names(&[
        "0001_create_projects",
        "0002_create_tasks",
        "0003_create_task_stages",
    ]);
    manifest.permissions = names(&[
        "manage-project",
        "create-project",
        "show-project",
        "manage-task",
        "manage-task-stage",
    ]);
    manifest.fanout = vec![
        PermissionFanoutPolicy::new(&[Staff], &["manage-project", "show-project", "manage-task"]),
        PermissionFanoutPolicy::new(&[Client], &["manage-project", "show-project"]),
    ];
    manifest.seed_plan = SeedPlan::default()
        .with_set(TASK_STAGE, &["Todo", "In Progress", "Review", "Done"]);
    manifest.listens_to = vec![EventKind::RoleCreated, EventKind::TenantProvisioned];
    manifest.settings_menu = vec![MenuItem::new(
        "Task Stages",
        "/settings/task-stages",
        Some("manage-task-stage"),
        "layout-kanban",
    )];
    manifest.nav_menu = vec![MenuItem::new(
        "Projects",
        "/projects",
        Some("manage-project"),
        "square-check",
    )];
    manifest
}

fn zoom_meeting() -> ModuleManifest {
    let mut manifest = ModuleManifest::new(ModuleId::ZoomMeeting, "1.0.0");
    manifest.routes = vec![
        RouteDecl::new(Get, "/zoom-meetings", Some("manage-zoom-meetings")),
        RouteDecl::new(Post, "/zoom-meetings", Some("create-zoom-meetings")),
        RouteDecl::new(Get, "/zoom-meetings/{id}", Some("show-zoom-meetings")),
    ];
    manifest.migrations = names(&["0001_create_zoom_meetings"]);
    manifest.permissions = names(&[
        "manage-zoom-meetings",
        "create-zoom-meetings",
        "show-zoom-meetings",
    ]);
    manifest.fanout = vec![PermissionFanoutPolicy::new(
        &[Staff, Client],
        &["manage-zoom-meetings", "show-zoom-meetings"],
    )];
    manifest.listens_to = vec![EventKind::RoleCreated];
    manifest.nav_menu = vec![MenuItem::new(
        "Zoom Meetings",
        "/zoom-meetings",
        Some("manage-zoom-meetings"),
        "video",
    )];
    manifest
}
