//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define data access contracts for tenants, roles, seed data, ledger and
//!   prompts.
//! - Keep SQL details out of listeners and services.
//!
//! # Invariants
//! - Writes that listeners perform are idempotent (insert-if-absent or
//!   guarded update), since the event bus offers no transaction across
//!   listeners.
//! - Multi-statement writes go through `WriteScope`, so they also work when
//!   the caller publishes from inside its own transaction.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod ledger_repo;
pub mod prompt_repo;
pub mod role_repo;
pub mod seed_repo;
pub mod tenant_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all persistence adapters.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(String),
    Conflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Conflict(what) => write!(f, "already exists: {what}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

const WRITE_SAVEPOINT: &str = "bizsuite_write";

/// Atomic write unit that nests inside a caller's open transaction.
///
/// Backed by a named savepoint, which starts a transaction of its own in
/// autocommit mode and becomes a nested scope otherwise. Dropping the scope
/// without `commit` rolls back its writes only.
pub(crate) struct WriteScope<'conn> {
    conn: &'conn rusqlite::Connection,
    open: bool,
}

impl<'conn> WriteScope<'conn> {
    pub(crate) fn begin(conn: &'conn rusqlite::Connection) -> RepoResult<Self> {
        conn.execute_batch(&format!("SAVEPOINT {WRITE_SAVEPOINT};"))?;
        Ok(Self { conn, open: true })
    }

    pub(crate) fn commit(mut self) -> RepoResult<()> {
        self.open = false;
        self.conn
            .execute_batch(&format!("RELEASE {WRITE_SAVEPOINT};"))?;
        Ok(())
    }
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.conn.execute_batch(&format!(
                "ROLLBACK TO {WRITE_SAVEPOINT}; RELEASE {WRITE_SAVEPOINT};"
            ));
        }
    }
}
