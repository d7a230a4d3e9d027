//! Connection bootstrap.
//!
//! Every connection handed out here has `foreign_keys=ON`, a busy timeout,
//! and all migrations applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::CoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a database file.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Opens `config.database_path`, or an in-memory database when unset.
pub fn open_configured(config: &CoreConfig) -> DbResult<Connection> {
    match &config.database_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect()
        .map_err(DbError::from)
        .and_then(|mut conn| prepare(&mut conn).map(|applied| (conn, applied)));

    match result {
        Ok((conn, applied)) => {
            info!(
                "event=db_open module=db status=ok mode={} migrations_applied={} duration_ms={}",
                mode,
                applied,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn prepare(conn: &mut Connection) -> DbResult<usize> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(apply_migrations(conn)?.len())
}
