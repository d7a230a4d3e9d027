//! SQLite migration registry and executor.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - All pending migrations are applied in one transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_tenancy.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_access.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("0003_seed_records.sql"),
    },
    Migration {
        version: 4,
        sql: include_str!("0004_ledger.sql"),
    },
    Migration {
        version: 5,
        sql: include_str!("0005_ai_prompts.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations and returns the versions that ran.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<u32>> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
    }
    tx.commit()?;

    let applied: Vec<u32> = pending.iter().map(|migration| migration.version).collect();
    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} applied={}",
        from_version,
        latest,
        applied.len()
    );
    Ok(applied)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    Ok(version)
}
