//! Boot-time module catalog.
//!
//! # Invariants
//! - Every registered manifest passed `ModuleManifest::validate`.
//! - A module id is registered at most once; registration order is kept and
//!   drives listener binding order on the bus.

use crate::event::domain::EventKind;
use crate::module::builtin::builtin_manifests;
use crate::module::id::{ModuleId, ModuleSet};
use crate::module::manifest::{ManifestValidationError, MenuItem, MenuKind, ModuleManifest};
use crate::permission::store::SqlitePermissionStore;
use crate::repo::{RepoResult, WriteScope};
use log::info;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registered modules and their event subscriptions.
#[derive(Debug, Default)]
pub struct ModuleCatalog {
    order: Vec<ModuleId>,
    entries: BTreeMap<ModuleId, ModuleManifest>,
    event_index: BTreeMap<EventKind, Vec<ModuleId>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in module registered.
    pub fn with_builtin_modules() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for manifest in builtin_manifests() {
            catalog.register(manifest)?;
        }
        Ok(catalog)
    }

    /// Registers one manifest after validation.
    pub fn register(&mut self, manifest: ModuleManifest) -> Result<(), CatalogError> {
        manifest
            .validate()
            .map_err(|err| CatalogError::InvalidManifest(manifest.id, err))?;
        if self.entries.contains_key(&manifest.id) {
            return Err(CatalogError::DuplicateModule(manifest.id));
        }

        for kind in &manifest.listens_to {
            self.event_index.entry(*kind).or_default().push(manifest.id);
        }
        self.order.push(manifest.id);
        self.entries.insert(manifest.id, manifest);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, module: ModuleId) -> Option<&ModuleManifest> {
        self.entries.get(&module)
    }

    /// Manifests in registration order.
    pub fn manifests(&self) -> impl Iterator<Item = &ModuleManifest> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Modules subscribed to `kind`, in registration order.
    pub fn modules_for_event(&self, kind: EventKind) -> &[ModuleId] {
        self.event_index
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declares every module permission in the permission store.
    ///
    /// Returns the number of names that were not present before.
    pub fn install_permissions(&self, conn: &Connection) -> RepoResult<usize> {
        let store = SqlitePermissionStore::new(conn);
        let scope = WriteScope::begin(conn)?;
        let mut inserted = 0;
        for manifest in self.manifests() {
            for permission in &manifest.permissions {
                if store.register(permission, manifest.id)? {
                    inserted += 1;
                }
            }
        }
        scope.commit()?;
        info!(
            "event=permissions_install module=catalog status=ok modules={} inserted={}",
            self.len(),
            inserted
        );
        Ok(inserted)
    }

    /// Menu items of active modules the caller may see, in registration order.
    ///
    /// Items without a required permission are always visible.
    pub fn menu_for(
        &self,
        kind: MenuKind,
        active: &ModuleSet,
        granted: &BTreeSet<String>,
    ) -> Vec<&MenuItem> {
        self.manifests()
            .filter(|manifest| active.contains(manifest.id))
            .flat_map(|manifest| manifest.menu(kind))
            .filter(|item| {
                item.permission
                    .as_ref()
                    .map_or(true, |permission| granted.contains(permission))
            })
            .collect()
    }
}

/// Catalog registration and wiring errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    InvalidManifest(ModuleId, ManifestValidationError),
    DuplicateModule(ModuleId),
    /// The module listens to an event kind it has no listener for.
    UnsupportedBinding(ModuleId, EventKind),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidManifest(module, err) => {
                write!(f, "invalid manifest for module {module}: {err}")
            }
            Self::DuplicateModule(module) => write!(f, "module already registered: {module}"),
            Self::UnsupportedBinding(module, kind) => {
                write!(f, "module {module} has no listener for {kind}")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidManifest(_, err) => Some(err),
            Self::DuplicateModule(_) | Self::UnsupportedBinding(..) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, ModuleCatalog};
    use crate::db::open_db_in_memory;
    use crate::event::domain::EventKind;
    use crate::module::builtin::builtin_manifests;
    use crate::module::id::{ModuleId, ModuleSet};
    use crate::module::manifest::{MenuKind, ModuleManifest};
    use crate::permission::store::{PermissionStore, SqlitePermissionStore};
    use std::collections::BTreeSet;

    #[test]
    fn registers_every_builtin_module() {
        let catalog = ModuleCatalog::with_builtin_modules().expect("builtin catalog");
        assert_eq!(catalog.len(), ModuleId::ALL.len());
        for module in ModuleId::ALL {
            assert!(catalog.get(module).is_some(), "missing {module}");
        }
    }

    #[test]
    fn rejects_duplicate_module_id() {
        let mut catalog = ModuleCatalog::new();
        catalog
            .register(ModuleManifest::new(ModuleId::Contract, "1.0.0"))
            .expect("first registration should succeed");
        let err = catalog
            .register(ModuleManifest::new(ModuleId::Contract, "1.0.1"))
            .expect_err("duplicate registration must fail");
        assert_eq!(err, CatalogError::DuplicateModule(ModuleId::Contract));
    }

    #[test]
    fn rejects_invalid_manifest() {
        let mut catalog = ModuleCatalog::new();
        let err = catalog
            .register(ModuleManifest::new(ModuleId::Contract, "1.0"))
            .expect_err("invalid version must fail");
        assert!(matches!(
            err,
            CatalogError::InvalidManifest(ModuleId::Contract, _)
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn indexes_modules_by_event_in_registration_order() {
        let catalog = ModuleCatalog::with_builtin_modules().unwrap();
        let registration_order: Vec<ModuleId> = builtin_manifests()
            .into_iter()
            .filter(|manifest| manifest.listens_to.contains(&EventKind::LedgerEntryPosted))
            .map(|manifest| manifest.id)
            .collect();

        assert_eq!(
            catalog.modules_for_event(EventKind::LedgerEntryPosted),
            registration_order.as_slice()
        );
        assert!(catalog
            .modules_for_event(EventKind::RoleCreated)
            .contains(&ModuleId::Hrm));
    }

    #[test]
    fn installs_declared_permissions_once() {
        let conn = open_db_in_memory().unwrap();
        let catalog = ModuleCatalog::with_builtin_modules().unwrap();

        let first = catalog.install_permissions(&conn).unwrap();
        let second = catalog.install_permissions(&conn).unwrap();

        assert!(first > 0);
        assert_eq!(second, 0);
        let store = SqlitePermissionStore::new(&conn);
        assert!(store.exists("manage-zoom-meetings").unwrap());
        assert!(!store.exists("manage-nonexistent").unwrap());
    }

    #[test]
    fn menu_lists_only_active_and_permitted_items() {
        let catalog = ModuleCatalog::with_builtin_modules().unwrap();
        let active = ModuleSet::parse_csv("Lead");
        let granted: BTreeSet<String> = ["manage-lead".to_string()].into_iter().collect();

        let items = catalog.menu_for(MenuKind::Navigation, &active, &granted);
        assert!(!items.is_empty());
        assert!(items
            .iter()
            .all(|item| item.permission.as_deref().map_or(true, |p| p == "manage-lead")));

        let none = catalog.menu_for(MenuKind::Navigation, &ModuleSet::new(), &granted);
        assert!(none.is_empty());
    }
}
