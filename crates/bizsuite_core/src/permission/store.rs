//! Permission catalog and role grants.

use crate::model::role::RoleId;
use crate::module::id::ModuleId;
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// Permission store contract consumed by the fan-out protocol.
pub trait PermissionStore {
    fn exists(&self, name: &str) -> RepoResult<bool>;
    /// Grants `name` to `role`. Returns `true` when the grant is new.
    fn grant(&self, role: RoleId, name: &str) -> RepoResult<bool>;
    fn has_granted(&self, role: RoleId, name: &str) -> RepoResult<bool>;
}

pub struct SqlitePermissionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePermissionStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Declares a permission owned by `module`. Existing names are kept.
    pub fn register(&self, name: &str, module: ModuleId) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO permissions (name, module) VALUES (?1, ?2);",
            params![name, module.as_str()],
        )?;
        Ok(inserted > 0)
    }

    /// Permission names held by a role, sorted.
    pub fn granted_permissions(&self, role: RoleId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT permission_name FROM role_permissions
             WHERE role_uuid = ?1
             ORDER BY permission_name ASC;",
        )?;
        let names = stmt
            .query_map([role.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl PermissionStore for SqlitePermissionStore<'_> {
    fn exists(&self, name: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM permissions WHERE name = ?1);",
            [name],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn grant(&self, role: RoleId, name: &str) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO role_permissions (role_uuid, permission_name) VALUES (?1, ?2);",
            params![role.to_string(), name],
        )?;
        Ok(inserted > 0)
    }

    fn has_granted(&self, role: RoleId, name: &str) -> RepoResult<bool> {
        let granted = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM role_permissions WHERE role_uuid = ?1 AND permission_name = ?2
             );",
            params![role.to_string(), name],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(granted)
    }
}
