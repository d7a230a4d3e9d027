//! Module catalog: typed ids, manifests, activation registry.

pub mod builtin;
pub mod catalog;
pub mod id;
pub mod manifest;
pub mod registry;

pub use catalog::{CatalogError, ModuleCatalog};
pub use id::{parse_module_id, ModuleId, ModuleIdError, ModuleSet};
pub use manifest::{
    HttpMethod, ManifestValidationError, MenuItem, MenuKind, ModuleManifest, RouteDecl, SeedPlan,
    SeedSet,
};
pub use registry::{CachedModuleRegistry, ModuleRegistry};
