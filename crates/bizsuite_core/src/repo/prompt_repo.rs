//! Stored AI prompt templates.

use crate::model::tenant::TenantId;
use crate::module::id::ModuleId;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

const PLATFORM_SCOPE: &str = "";

/// Owner of a stored template: one tenant, or the platform default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptScope {
    Tenant(TenantId),
    Platform,
}

impl PromptScope {
    fn key(self) -> String {
        match self {
            Self::Tenant(id) => id.to_string(),
            Self::Platform => PLATFORM_SCOPE.to_string(),
        }
    }
}

pub trait PromptRepository {
    fn upsert_prompt(
        &self,
        scope: PromptScope,
        module: ModuleId,
        key: &str,
        template: &str,
    ) -> RepoResult<()>;
    fn find_prompt(
        &self,
        scope: PromptScope,
        module: ModuleId,
        key: &str,
    ) -> RepoResult<Option<String>>;
}

pub struct SqlitePromptRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePromptRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PromptRepository for SqlitePromptRepository<'_> {
    fn upsert_prompt(
        &self,
        scope: PromptScope,
        module: ModuleId,
        key: &str,
        template: &str,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO ai_prompts (tenant_uuid, module, prompt_key, template)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (tenant_uuid, module, prompt_key) DO UPDATE SET
                template = excluded.template,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![scope.key(), module.as_str(), key.trim(), template],
        )?;
        Ok(())
    }

    fn find_prompt(
        &self,
        scope: PromptScope,
        module: ModuleId,
        key: &str,
    ) -> RepoResult<Option<String>> {
        let template = self
            .conn
            .query_row(
                "SELECT template FROM ai_prompts
                 WHERE tenant_uuid = ?1 AND module = ?2 AND prompt_key = ?3;",
                params![scope.key(), module.as_str(), key.trim()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(template)
    }
}
