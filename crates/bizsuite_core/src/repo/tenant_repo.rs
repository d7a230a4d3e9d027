//! Tenant and tenant-module persistence.

use crate::model::tenant::{TenantId, TenantRecord};
use crate::module::id::{parse_module_id, ModuleSet};
use crate::repo::{is_unique_violation, parse_uuid, RepoError, RepoResult, WriteScope};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

/// Repository interface for tenants and their enabled modules.
pub trait TenantRepository {
    fn create_tenant(&self, tenant: &TenantRecord) -> RepoResult<TenantId>;
    fn get_tenant(&self, id: TenantId) -> RepoResult<Option<TenantRecord>>;
    /// Replaces the whole enabled-module set of one tenant.
    fn replace_modules(&self, id: TenantId, modules: &ModuleSet) -> RepoResult<()>;
    /// Returns every tenant's module set, used to warm the registry cache.
    fn list_module_sets(&self) -> RepoResult<BTreeMap<TenantId, ModuleSet>>;
}

pub struct SqliteTenantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTenantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_modules(&self, id: TenantId) -> RepoResult<ModuleSet> {
        let mut stmt = self.conn.prepare(
            "SELECT module FROM tenant_modules WHERE tenant_uuid = ?1 ORDER BY module;",
        )?;
        let names = stmt
            .query_map([id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        names
            .iter()
            .map(|name| decode_module(name))
            .collect::<RepoResult<ModuleSet>>()
    }
}

impl TenantRepository for SqliteTenantRepository<'_> {
    fn create_tenant(&self, tenant: &TenantRecord) -> RepoResult<TenantId> {
        if tenant.name.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "tenant name must not be blank".to_string(),
            ));
        }

        let scope = WriteScope::begin(self.conn)?;
        self.conn.execute(
            "INSERT INTO tenants (uuid, name) VALUES (?1, ?2);",
            params![tenant.uuid.to_string(), tenant.name.trim()],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepoError::Conflict(format!("tenant {}", tenant.uuid))
            } else {
                err.into()
            }
        })?;
        for module in tenant.modules.iter() {
            self.conn.execute(
                "INSERT INTO tenant_modules (tenant_uuid, module) VALUES (?1, ?2);",
                params![tenant.uuid.to_string(), module.as_str()],
            )?;
        }
        scope.commit()?;
        Ok(tenant.uuid)
    }

    fn get_tenant(&self, id: TenantId) -> RepoResult<Option<TenantRecord>> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM tenants WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let Some(name) = name else {
            return Ok(None);
        };

        Ok(Some(TenantRecord {
            uuid: id,
            name,
            modules: self.load_modules(id)?,
        }))
    }

    fn replace_modules(&self, id: TenantId, modules: &ModuleSet) -> RepoResult<()> {
        let scope = WriteScope::begin(self.conn)?;
        let changed = self.conn.execute(
            "UPDATE tenants
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(format!("tenant {id}")));
        }

        self.conn.execute(
            "DELETE FROM tenant_modules WHERE tenant_uuid = ?1;",
            [id.to_string()],
        )?;
        for module in modules.iter() {
            self.conn.execute(
                "INSERT INTO tenant_modules (tenant_uuid, module) VALUES (?1, ?2);",
                params![id.to_string(), module.as_str()],
            )?;
        }
        scope.commit()?;
        Ok(())
    }

    fn list_module_sets(&self) -> RepoResult<BTreeMap<TenantId, ModuleSet>> {
        let mut sets = BTreeMap::<TenantId, ModuleSet>::new();
        let mut stmt = self.conn.prepare("SELECT uuid FROM tenants;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for id in ids {
            sets.insert(parse_uuid(&id, "tenants.uuid")?, ModuleSet::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT tenant_uuid, module FROM tenant_modules;")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (tenant, module) in rows {
            let tenant = parse_uuid(&tenant, "tenant_modules.tenant_uuid")?;
            sets.entry(tenant).or_default().insert(decode_module(&module)?);
        }
        Ok(sets)
    }
}

fn decode_module(name: &str) -> RepoResult<crate::module::id::ModuleId> {
    parse_module_id(name).map_err(|_| {
        RepoError::InvalidData(format!("invalid module `{name}` in tenant_modules.module"))
    })
}
