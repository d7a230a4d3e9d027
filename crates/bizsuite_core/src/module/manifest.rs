//! Module manifest declaration and validation.
//!
//! A manifest is everything a module contributes to the host at boot: routes,
//! migrations, permissions with their fan-out policies, default seed data,
//! listener bindings, and menu entries for the UI shell.

use crate::event::domain::EventKind;
use crate::module::id::ModuleId;
use crate::permission::policy::PermissionFanoutPolicy;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PERMISSION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid permission name regex"));
static MIGRATION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}_[a-z0-9_]+$").expect("valid migration name regex"));
static ROUTE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/[a-z0-9_\-{}]+)+$|^/$").expect("valid route path regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// One HTTP route a module mounts into the host router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecl {
    pub method: HttpMethod,
    pub path: String,
    /// Permission the host checks before dispatching.
    pub permission: Option<String>,
}

impl RouteDecl {
    pub fn new(method: HttpMethod, path: &str, permission: Option<&str>) -> Self {
        Self {
            method,
            path: path.to_string(),
            permission: permission.map(str::to_string),
        }
    }
}

/// Which UI shell menu an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    Settings,
    Navigation,
}

/// Opaque menu contribution rendered by the UI shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub title: String,
    pub link: String,
    pub permission: Option<String>,
    pub icon: String,
}

impl MenuItem {
    pub fn new(title: &str, link: &str, permission: Option<&str>, icon: &str) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            permission: permission.map(str::to_string),
            icon: icon.to_string(),
        }
    }
}

/// Default records of one kind, installed in listed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSet {
    pub kind: String,
    pub names: Vec<String>,
}

/// Default data a module installs for every tenant that activates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPlan {
    pub sets: Vec<SeedSet>,
}

impl SeedPlan {
    pub fn with_set(mut self, kind: &str, names: &[&str]) -> Self {
        self.sets.push(SeedSet {
            kind: kind.to_string(),
            names: names.iter().map(|name| name.to_string()).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(|set| set.names.is_empty())
    }

    pub fn record_count(&self) -> usize {
        self.sets.iter().map(|set| set.names.len()).sum()
    }
}

/// Declarative module manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub id: ModuleId,
    /// Semantic version string (`major.minor.patch`).
    pub version: String,
    pub routes: Vec<RouteDecl>,
    /// Migration names (`NNNN_snake_name`) owned by the module.
    pub migrations: Vec<String>,
    /// Permission names the module declares into the permission store.
    pub permissions: Vec<String>,
    pub fanout: Vec<PermissionFanoutPolicy>,
    pub seed_plan: SeedPlan,
    /// Event kinds the module's listeners subscribe to.
    pub listens_to: Vec<EventKind>,
    pub settings_menu: Vec<MenuItem>,
    pub nav_menu: Vec<MenuItem>,
}

impl ModuleManifest {
    /// Empty manifest for `id`, filled in by builder-style helpers.
    pub fn new(id: ModuleId, version: &str) -> Self {
        Self {
            id,
            version: version.to_string(),
            routes: Vec::new(),
            migrations: Vec::new(),
            permissions: Vec::new(),
            fanout: Vec::new(),
            seed_plan: SeedPlan::default(),
            listens_to: Vec::new(),
            settings_menu: Vec::new(),
            nav_menu: Vec::new(),
        }
    }

    pub fn menu(&self, kind: MenuKind) -> &[MenuItem] {
        match kind {
            MenuKind::Settings => &self.settings_menu,
            MenuKind::Navigation => &self.nav_menu,
        }
    }

    /// Validates declaration-level manifest invariants.
    ///
    /// Fan-out policies may name permissions the module does not declare;
    /// those are skipped at grant time rather than rejected here.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if !is_semver_triplet(self.version.trim()) {
            return Err(ManifestValidationError::InvalidVersion(
                self.version.clone(),
            ));
        }

        let mut routes = BTreeSet::new();
        for route in &self.routes {
            if !ROUTE_PATH_RE.is_match(&route.path) {
                return Err(ManifestValidationError::InvalidRoutePath(
                    route.path.clone(),
                ));
            }
            if !routes.insert((route.method, route.path.as_str())) {
                return Err(ManifestValidationError::DuplicateRoute(route.path.clone()));
            }
        }

        let mut migrations = BTreeSet::new();
        for migration in &self.migrations {
            if !MIGRATION_NAME_RE.is_match(migration) {
                return Err(ManifestValidationError::InvalidMigrationName(
                    migration.clone(),
                ));
            }
            if !migrations.insert(migration.as_str()) {
                return Err(ManifestValidationError::DuplicateMigration(
                    migration.clone(),
                ));
            }
        }

        let mut permissions = BTreeSet::new();
        for permission in &self.permissions {
            if !PERMISSION_NAME_RE.is_match(permission) {
                return Err(ManifestValidationError::InvalidPermissionName(
                    permission.clone(),
                ));
            }
            if !permissions.insert(permission.as_str()) {
                return Err(ManifestValidationError::DuplicatePermission(
                    permission.clone(),
                ));
            }
        }

        let mut bindings = BTreeSet::new();
        for kind in &self.listens_to {
            if !bindings.insert(*kind) {
                return Err(ManifestValidationError::DuplicateListenerBinding(*kind));
            }
        }
        if bindings.contains(&EventKind::RoleCreated) && self.fanout.is_empty() {
            return Err(ManifestValidationError::MissingFanoutPolicy);
        }
        if bindings.contains(&EventKind::TenantProvisioned) && self.seed_plan.is_empty() {
            return Err(ManifestValidationError::MissingSeedPlan);
        }

        for item in self.settings_menu.iter().chain(&self.nav_menu) {
            if item.title.trim().is_empty() || item.link.trim().is_empty() {
                return Err(ManifestValidationError::InvalidMenuItem(item.title.clone()));
            }
        }
        Ok(())
    }
}

fn is_semver_triplet(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Manifest validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    InvalidVersion(String),
    InvalidRoutePath(String),
    DuplicateRoute(String),
    InvalidMigrationName(String),
    DuplicateMigration(String),
    InvalidPermissionName(String),
    DuplicatePermission(String),
    DuplicateListenerBinding(EventKind),
    MissingFanoutPolicy,
    MissingSeedPlan,
    InvalidMenuItem(String),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidVersion(value) => write!(
                f,
                "manifest version is invalid: {value} (expected major.minor.patch)"
            ),
            Self::InvalidRoutePath(value) => write!(f, "route path is invalid: {value}"),
            Self::DuplicateRoute(value) => write!(f, "route is declared twice: {value}"),
            Self::InvalidMigrationName(value) => write!(f, "migration name is invalid: {value}"),
            Self::DuplicateMigration(value) => write!(f, "migration is declared twice: {value}"),
            Self::InvalidPermissionName(value) => {
                write!(f, "permission name is invalid: {value}")
            }
            Self::DuplicatePermission(value) => {
                write!(f, "permission is declared twice: {value}")
            }
            Self::DuplicateListenerBinding(kind) => {
                write!(f, "listener binding is declared twice: {kind}")
            }
            Self::MissingFanoutPolicy => {
                write!(f, "role_created binding requires a permission fan-out policy")
            }
            Self::MissingSeedPlan => {
                write!(f, "tenant_provisioned binding requires a seed plan")
            }
            Self::InvalidMenuItem(title) => {
                write!(f, "menu item needs a title and a link: `{title}`")
            }
        }
    }
}

impl Error for ManifestValidationError {}
