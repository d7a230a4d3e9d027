//! Domain records shared by services, listeners and repositories.
//!
//! # Invariants
//! - Tenants and roles are identified by stable v4 UUIDs.
//! - Role names are stored exactly as provided by the host application.

pub mod ledger;
pub mod role;
pub mod tenant;
