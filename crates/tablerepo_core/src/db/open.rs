//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections as `ConnectionHandle`s.
//! - Apply the pragmas and lock-wait deadline from `ConnectionConfig`.
//!
//! # Invariants
//! - Returned handles have `foreign_keys` set exactly as configured.
//! - Double-quoted names always resolve as identifiers; an unknown quoted
//!   column is an error, never a string literal.
//! - Bootstrap failures are logged once and returned, never swallowed.

use super::config::ConnectionConfig;
use super::handle::ConnectionHandle;
use super::DbResult;
use log::{error, info};
use rusqlite::config::DbConfig;
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens a SQLite database file with default settings.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<ConnectionHandle> {
    open_with_config(&ConnectionConfig::file(path.as_ref()))
}

/// Opens a private in-memory SQLite database with default settings.
pub fn open_db_in_memory() -> DbResult<ConnectionHandle> {
    open_with_config(&ConnectionConfig::in_memory())
}

/// Opens a connection described by `config`.
///
/// # Side effects
/// - Creates the database file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_with_config(config: &ConnectionConfig) -> DbResult<ConnectionHandle> {
    let started_at = Instant::now();
    let mode = if config.path.is_some() { "file" } else { "memory" };
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match config.path.as_deref() {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn, config) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} foreign_keys={} busy_timeout_ms={} duration_ms={}",
                config.foreign_keys,
                config.busy_timeout_ms,
                started_at.elapsed().as_millis()
            );
            Ok(ConnectionHandle::new(conn))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &Connection, config: &ConnectionConfig) -> DbResult<()> {
    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(config.busy_timeout())?;
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DML, false)?;
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DDL, false)?;
    Ok(())
}
