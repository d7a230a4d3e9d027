//! Module default-data (seed record) persistence.
//!
//! # Invariants
//! - `(tenant, module, kind, name)` is unique; inserting an existing seed row
//!   is a no-op. Default-data listeners rely on this for re-run safety.

use crate::model::tenant::TenantId;
use crate::module::id::ModuleId;
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// One default record installed for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRow {
    pub module: ModuleId,
    pub kind: String,
    pub name: String,
    pub position: u32,
}

pub trait SeedRepository {
    /// Inserts the row unless it already exists. Returns `true` on insert.
    fn insert_if_absent(&self, tenant: TenantId, row: &SeedRow) -> RepoResult<bool>;
    fn count_for_module(&self, tenant: TenantId, module: ModuleId) -> RepoResult<u32>;
    /// Seed names of one kind ordered by position.
    fn list_names(&self, tenant: TenantId, kind: &str) -> RepoResult<Vec<String>>;
}

pub struct SqliteSeedRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSeedRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SeedRepository for SqliteSeedRepository<'_> {
    fn insert_if_absent(&self, tenant: TenantId, row: &SeedRow) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO seed_records (tenant_uuid, module, kind, name, position)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                tenant.to_string(),
                row.module.as_str(),
                row.kind.as_str(),
                row.name.as_str(),
                row.position,
            ],
        )?;
        Ok(inserted > 0)
    }

    fn count_for_module(&self, tenant: TenantId, module: ModuleId) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM seed_records WHERE tenant_uuid = ?1 AND module = ?2;",
            params![tenant.to_string(), module.as_str()],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    fn list_names(&self, tenant: TenantId, kind: &str) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM seed_records
             WHERE tenant_uuid = ?1 AND kind = ?2
             ORDER BY position ASC, name ASC;",
        )?;
        let names = stmt
            .query_map(params![tenant.to_string(), kind], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
