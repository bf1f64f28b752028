//! Executor for application-supplied schema migrations.
//!
//! # Invariants
//! - `version` values must strictly increase; zero is reserved for "empty".
//! - Pending migrations run inside one transaction.
//! - Applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// One schema step owned by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub sql: &'static str,
}

impl Migration {
    pub const fn new(version: u32, sql: &'static str) -> Self {
        Self { version, sql }
    }
}

/// Returns the highest version in `migrations`, or `0` when empty.
pub fn latest_version(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies every migration newer than the current schema version.
///
/// Returns the schema version after the call.
///
/// # Errors
/// - [`DbError::InvalidMigrationOrder`] when versions do not strictly increase.
/// - [`DbError::UnsupportedSchemaVersion`] when the database is newer than
///   the latest migration.
/// - [`DbError::Sqlite`] when a statement fails; nothing is applied then.
pub fn apply_migrations(conn: &mut Connection, migrations: &[Migration]) -> DbResult<u32> {
    check_order(migrations)?;

    let current_version = schema_version(conn)?;
    let latest = latest_version(migrations);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(current_version);
    }

    let tx = conn.transaction()?;
    for migration in migrations {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    Ok(latest)
}

fn check_order(migrations: &[Migration]) -> DbResult<()> {
    let mut previous = 0;
    for migration in migrations {
        if migration.version <= previous {
            return Err(DbError::InvalidMigrationOrder {
                previous,
                next: migration.version,
            });
        }
        previous = migration.version;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_order, latest_version, Migration};
    use crate::db::DbError;

    #[test]
    fn latest_version_of_empty_list_is_zero() {
        assert_eq!(latest_version(&[]), 0);
    }

    #[test]
    fn check_order_rejects_duplicates_and_zero() {
        let duplicated = [Migration::new(1, ""), Migration::new(1, "")];
        assert!(matches!(
            check_order(&duplicated),
            Err(DbError::InvalidMigrationOrder {
                previous: 1,
                next: 1
            })
        ));

        let zero = [Migration::new(0, "")];
        assert!(check_order(&zero).is_err());

        let gapped = [Migration::new(1, ""), Migration::new(5, "")];
        assert!(check_order(&gapped).is_ok());
    }
}
