//! Role persistence.

use crate::model::role::{RoleId, RoleRecord};
use crate::model::tenant::TenantId;
use crate::repo::{is_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for tenant roles.
pub trait RoleRepository {
    /// Inserts a role; a second role with the same name in one tenant is a
    /// `Conflict`.
    fn create_role(&self, role: &RoleRecord) -> RepoResult<RoleId>;
    fn find_role_by_name(&self, tenant: TenantId, name: &str) -> RepoResult<Option<RoleRecord>>;
}

pub struct SqliteRoleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RoleRepository for SqliteRoleRepository<'_> {
    fn create_role(&self, role: &RoleRecord) -> RepoResult<RoleId> {
        let name = role.name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData(
                "role name must not be blank".to_string(),
            ));
        }

        self.conn
            .execute(
                "INSERT INTO roles (uuid, tenant_uuid, name) VALUES (?1, ?2, ?3);",
                params![role.uuid.to_string(), role.tenant_uuid.to_string(), name],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Conflict(format!("role `{name}` in tenant {}", role.tenant_uuid))
                } else {
                    err.into()
                }
            })?;
        Ok(role.uuid)
    }

    fn find_role_by_name(&self, tenant: TenantId, name: &str) -> RepoResult<Option<RoleRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, name FROM roles WHERE tenant_uuid = ?1 AND name = ?2;",
                params![tenant.to_string(), name.trim()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(uuid, name)| {
            Ok(RoleRecord {
                uuid: parse_uuid(&uuid, "roles.uuid")?,
                tenant_uuid: tenant,
                name,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::{RoleRepository, SqliteRoleRepository};
    use crate::db::open_db_in_memory;
    use crate::model::role::RoleRecord;
    use crate::model::tenant::TenantRecord;
    use crate::module::id::ModuleSet;
    use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
    use crate::repo::RepoError;

    #[test]
    fn finds_roles_by_trimmed_name_within_one_tenant() {
        let conn = open_db_in_memory().unwrap();
        let tenants = SqliteTenantRepository::new(&conn);
        let acme = TenantRecord::new("Acme", ModuleSet::new());
        let globex = TenantRecord::new("Globex", ModuleSet::new());
        tenants.create_tenant(&acme).unwrap();
        tenants.create_tenant(&globex).unwrap();
        let roles = SqliteRoleRepository::new(&conn);
        let staff = RoleRecord::new(acme.uuid, "staff");
        roles.create_role(&staff).unwrap();

        assert_eq!(
            roles.find_role_by_name(acme.uuid, " staff ").unwrap(),
            Some(staff)
        );
        assert_eq!(roles.find_role_by_name(globex.uuid, "staff").unwrap(), None);
        assert!(matches!(
            roles.create_role(&RoleRecord::new(acme.uuid, "staff")),
            Err(RepoError::Conflict(_))
        ));
    }
}
