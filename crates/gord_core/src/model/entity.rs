//! Table mapping contract for repository entities.

use super::identifier::Identifier;
use rusqlite::types::ToSql;
use rusqlite::Row;

/// A record type persisted in one SQLite table.
///
/// The repository only touches an entity through this trait: it reads the
/// key with [`Entity::id`], binds the remaining columns from
/// [`Entity::values`] and rebuilds rows with [`Entity::from_row`].
///
/// # Invariants
/// - `values()` yields exactly one value per entry of `COLUMNS`, in order.
/// - `COLUMNS` does not contain `ID_COLUMN`.
/// - `from_row` reads columns by name; it must accept rows selected as
///   `ID_COLUMN` followed by `COLUMNS`.
pub trait Entity: Default {
    /// Primary-key kind.
    type Id: Identifier;

    /// Table name, unquoted.
    const TABLE: &'static str;

    /// Primary-key column name, unquoted.
    const ID_COLUMN: &'static str = "id";

    /// Non-key column names, unquoted.
    const COLUMNS: &'static [&'static str];

    /// Returns the primary-key value. The zero value means "not persisted".
    fn id(&self) -> &Self::Id;

    /// Returns bind values for `COLUMNS`, in the same order.
    fn values(&self) -> Vec<&dyn ToSql>;

    /// Builds an entity from one selected row.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
