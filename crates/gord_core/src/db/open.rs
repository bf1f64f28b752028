//! Connection bootstrap for repository session handles.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply connection pragmas from [`DbConfig`].
//!
//! # Invariants
//! - Returned connections have `foreign_keys` set as configured.
//! - Returned connections have the configured busy timeout.
//! - Schema is left untouched; callers run their own migrations.

use super::DbResult;
use crate::config::DbConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file with default settings.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let config = DbConfig {
        path: Some(path.as_ref().to_path_buf()),
        ..DbConfig::default()
    };
    open_db_with(&config)
}

/// Opens a private in-memory SQLite database with default settings.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_db_with(&DbConfig::default())
}

/// Opens the database described by `config`.
///
/// `config.path == None` selects an in-memory database.
///
/// # Side effects
/// - Emits `db_open` logging events with mode, duration and status.
pub fn open_db_with(config: &DbConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = if config.path.is_some() { "file" } else { "memory" };
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match &config.path {
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

    if let Err(err) = configure_connection(&conn, config) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_configure_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn configure_connection(conn: &Connection, config: &DbConfig) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}
