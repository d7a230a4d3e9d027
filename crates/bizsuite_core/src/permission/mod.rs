//! Permission store and the fan-out protocol that grants module permissions
//! to archetype roles.
//!
//! # Invariants
//! - Granting is additive and idempotent.
//! - Unknown permission names are never created by a grant.
//! - Nothing in this module revokes a permission.

pub mod policy;
pub mod store;

pub use policy::{fan_out, FanoutReport, GrantState, PermissionFanoutPolicy};
pub use store::{PermissionStore, SqlitePermissionStore};
