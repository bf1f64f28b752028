//! Generic CRUD repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Offer one uniform CRUD surface for every [`Entity`].
//! - Keep statement text inside the repository boundary.
//!
//! # Invariants
//! - Each call runs on the borrowed connection only; no state is cached.
//! - Database errors are returned unchanged inside [`RepoError::Db`].
//! - Key-scoped writes refuse entities whose identifier is unset.
//! - `updates` validates the whole map before any statement runs.

use super::sql;
use super::update_map::{UpdateMap, UpdateValidationError};
use crate::db::DbError;
use crate::model::entity::Entity;
use crate::model::identifier::Identifier;
use log::{debug, warn};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

const SAVE_ALL_SAVEPOINT: &str = "gord_save_all";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for generic entity persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(UpdateValidationError),
    Db(DbError),
    /// A key-scoped write was given an entity with an unset identifier.
    MissingPrimaryKey { table: &'static str },
    /// SQLite assigned a rowid that the identifier kind cannot hold.
    RowIdOutOfRange { table: &'static str, rowid: i64 },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingPrimaryKey { table } => {
                write!(f, "missing primary key for write on `{table}`")
            }
            Self::RowIdOutOfRange { table, rowid } => {
                write!(f, "rowid {rowid} assigned in `{table}` does not fit the identifier type")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::MissingPrimaryKey { .. } | Self::RowIdOutOfRange { .. } => None,
        }
    }
}

impl From<UpdateValidationError> for RepoError {
    fn from(value: UpdateValidationError) -> Self {
        Self::Validation(value)
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

/// CRUD operations over one entity type.
///
/// Write operations that remove or modify rows return the number of rows
/// affected.
pub trait CrudRepository<T: Entity> {
    /// Total number of rows in `T::TABLE`.
    fn count(&self) -> RepoResult<i64>;
    /// Deletes the row matching `entity`'s identifier.
    fn delete(&self, entity: &T) -> RepoResult<usize>;
    /// Deletes every row. `entity` only selects the table.
    fn delete_all(&self, entity: &T) -> RepoResult<usize>;
    /// Deletes the rows of all entities that carry an identifier.
    fn delete_many(&self, entities: &[T]) -> RepoResult<usize>;
    /// Deletes rows whose identifier is in `ids`.
    fn delete_many_by_id(&self, entity: &T, ids: &[T::Id]) -> RepoResult<usize>;
    /// Deletes the row with identifier `id`.
    fn delete_by_id(&self, entity: &T, id: &T::Id) -> RepoResult<usize>;
    fn exist_by_id(&self, id: &T::Id) -> RepoResult<bool>;
    /// All rows ordered by identifier; empty when the table is empty.
    fn find_all(&self) -> RepoResult<Vec<T>>;
    /// Rows whose identifier is in `ids`, ordered by identifier.
    fn find_all_by_id(&self, ids: &[T::Id]) -> RepoResult<Vec<T>>;
    /// One row, or `None` when absent.
    fn find_by_id_opt(&self, id: &T::Id) -> RepoResult<Option<T>>;

    /// One row, or `T::default()` when absent.
    ///
    /// Absence is not an error; use [`CrudRepository::find_by_id_opt`] to
    /// tell the two apart.
    fn find_by_id(&self, id: &T::Id) -> RepoResult<T> {
        Ok(self.find_by_id_opt(id)?.unwrap_or_default())
    }

    /// Inserts when the identifier is unset, otherwise inserts or replaces
    /// the row with that identifier. Returns the row identifier.
    fn save(&self, entity: &T) -> RepoResult<T::Id>;
    /// Saves every entity atomically.
    fn save_all(&self, entities: &[T]) -> RepoResult<()>;
    /// Validates `changes`, then updates only those columns of `entity`'s row.
    fn updates(&self, entity: &T, changes: &UpdateMap) -> RepoResult<usize>;
    /// Inserts `entity` and returns its identifier.
    fn create(&self, entity: &T) -> RepoResult<T::Id>;
}

/// SQLite-backed repository borrowing a caller-owned connection.
///
/// A `rusqlite::Transaction` derefs to a `Connection`, so repositories can
/// run inside a caller-managed transaction.
pub struct SqliteRepository<'conn, T> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> T>,
}

impl<'conn, T: Entity> SqliteRepository<'conn, T> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// Returns the borrowed session handle.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn require_id<'e>(&self, entity: &'e T) -> RepoResult<&'e T::Id> {
        let id = entity.id();
        if id.is_unset() {
            return Err(RepoError::MissingPrimaryKey { table: T::TABLE });
        }
        Ok(id)
    }

    fn query_rows<P: rusqlite::Params>(&self, predicate: &str, params: P) -> RepoResult<Vec<T>> {
        let mut stmt = self.conn.prepare(&sql::select_sql::<T>(predicate))?;
        let rows = stmt
            .query_map(params, |row| T::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn log_write(op: &str, rows: usize) {
        debug!(
            "event=repo_write module=repo status=ok op={} table={} rows={}",
            op,
            T::TABLE,
            rows
        );
    }

    fn insert(&self, entity: &T) -> RepoResult<T::Id> {
        let id = entity.id();
        let assign_rowid = id.is_unset() && <T::Id as Identifier>::AUTO_INCREMENT;

        let mut bind: Vec<&dyn ToSql> = Vec::with_capacity(T::COLUMNS.len() + 1);
        if !assign_rowid {
            bind.push(id);
        }
        bind.extend(entity.values());

        self.conn
            .execute(&sql::insert_sql::<T>(!assign_rowid), bind.as_slice())?;
        Self::log_write("create", 1);

        if !assign_rowid {
            return Ok(id.clone());
        }

        let rowid = self.conn.last_insert_rowid();
        <T::Id as Identifier>::from_rowid(rowid).ok_or(RepoError::RowIdOutOfRange {
            table: T::TABLE,
            rowid,
        })
    }

    fn save_each(&self, entities: &[T]) -> RepoResult<()> {
        for entity in entities {
            self.save(entity)?;
        }
        Ok(())
    }
}

impl<T: Entity> CrudRepository<T> for SqliteRepository<'_, T> {
    fn count(&self) -> RepoResult<i64> {
        let count = self
            .conn
            .query_row(&sql::count_sql::<T>(sql::MATCH_ALL), [], |row| row.get(0))?;
        Ok(count)
    }

    fn delete(&self, entity: &T) -> RepoResult<usize> {
        let id = self.require_id(entity)?;
        let changed = self
            .conn
            .execute(&sql::delete_sql::<T>(&sql::id_eq::<T>()), params![id])?;
        Self::log_write("delete", changed);
        Ok(changed)
    }

    fn delete_all(&self, _entity: &T) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute(&sql::delete_sql::<T>(sql::MATCH_ALL), [])?;
        Self::log_write("delete_all", changed);
        Ok(changed)
    }

    fn delete_many(&self, entities: &[T]) -> RepoResult<usize> {
        if entities.is_empty() {
            return Ok(0);
        }

        let ids: Vec<&T::Id> = entities
            .iter()
            .map(|entity| entity.id())
            .filter(|id| !id.is_unset())
            .collect();
        if ids.is_empty() {
            return Err(RepoError::MissingPrimaryKey { table: T::TABLE });
        }

        let changed = self.conn.execute(
            &sql::delete_sql::<T>(&sql::id_in::<T>(ids.len())),
            params_from_iter(ids),
        )?;
        Self::log_write("delete_many", changed);
        Ok(changed)
    }

    fn delete_many_by_id(&self, _entity: &T, ids: &[T::Id]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let changed = self.conn.execute(
            &sql::delete_sql::<T>(&sql::id_in::<T>(ids.len())),
            params_from_iter(ids),
        )?;
        Self::log_write("delete_many_by_id", changed);
        Ok(changed)
    }

    fn delete_by_id(&self, _entity: &T, id: &T::Id) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute(&sql::delete_sql::<T>(&sql::id_eq::<T>()), params![id])?;
        Self::log_write("delete_by_id", changed);
        Ok(changed)
    }

    fn exist_by_id(&self, id: &T::Id) -> RepoResult<bool> {
        let count: i64 = self.conn.query_row(
            &sql::count_sql::<T>(&sql::id_eq::<T>()),
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        self.query_rows(sql::MATCH_ALL, [])
    }

    fn find_all_by_id(&self, ids: &[T::Id]) -> RepoResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_rows(&sql::id_in::<T>(ids.len()), params_from_iter(ids))
    }

    fn find_by_id_opt(&self, id: &T::Id) -> RepoResult<Option<T>> {
        let found = self
            .conn
            .query_row(&sql::select_sql::<T>(&sql::id_eq::<T>()), params![id], |row| {
                T::from_row(row)
            })
            .optional()?;
        Ok(found)
    }

    fn save(&self, entity: &T) -> RepoResult<T::Id> {
        let id = entity.id();
        if id.is_unset() {
            return self.insert(entity);
        }

        let mut bind: Vec<&dyn ToSql> = Vec::with_capacity(T::COLUMNS.len() + 1);
        bind.push(id);
        bind.extend(entity.values());

        self.conn.execute(&sql::upsert_sql::<T>(), bind.as_slice())?;
        Self::log_write("save", 1);
        Ok(id.clone())
    }

    fn save_all(&self, entities: &[T]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }

        self.conn
            .execute_batch(&format!("SAVEPOINT {SAVE_ALL_SAVEPOINT};"))?;

        match self.save_each(entities) {
            Ok(()) => {
                self.conn
                    .execute_batch(&format!("RELEASE {SAVE_ALL_SAVEPOINT};"))?;
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.execute_batch(&format!(
                    "ROLLBACK TO {SAVE_ALL_SAVEPOINT}; RELEASE {SAVE_ALL_SAVEPOINT};"
                )) {
                    warn!(
                        "event=repo_rollback module=repo status=error table={} error={}",
                        T::TABLE,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    fn updates(&self, entity: &T, changes: &UpdateMap) -> RepoResult<usize> {
        if let Err(err) = changes.valid() {
            warn!(
                "event=repo_updates module=repo status=rejected table={} error={}",
                T::TABLE,
                err
            );
            return Err(err.into());
        }
        if changes.is_empty() {
            return Ok(0);
        }
        let id = self.require_id(entity)?;

        let mut bind: Vec<&dyn ToSql> = Vec::with_capacity(changes.len() + 1);
        bind.extend(changes.iter().map(|(_, value)| value as &dyn ToSql));
        bind.push(id);

        let changed = self
            .conn
            .execute(&sql::update_sql::<T>(changes.keys()), bind.as_slice())?;
        Self::log_write("updates", changed);
        Ok(changed)
    }

    fn create(&self, entity: &T) -> RepoResult<T::Id> {
        self.insert(entity)
    }
}
