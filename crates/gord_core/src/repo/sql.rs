//! Statement text builders for entity tables.
//!
//! Every table and column name goes through [`quote_ident`]; values are
//! always bound as positional `?` parameters.

use crate::model::entity::Entity;

/// Wildcard predicate matching every row.
pub(crate) const MATCH_ALL: &str = "1 = 1";

/// Quotes an SQL identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn table<T: Entity>() -> String {
    quote_ident(T::TABLE)
}

fn column_list<T: Entity>() -> String {
    std::iter::once(T::ID_COLUMN)
        .chain(T::COLUMNS.iter().copied())
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"id" = ?`
pub(crate) fn id_eq<T: Entity>() -> String {
    format!("{} = ?", quote_ident(T::ID_COLUMN))
}

/// `"id" IN (?, ?, ...)` for `count` identifiers.
pub(crate) fn id_in<T: Entity>(count: usize) -> String {
    format!("{} IN ({})", quote_ident(T::ID_COLUMN), placeholders(count))
}

pub(crate) fn count_sql<T: Entity>(predicate: &str) -> String {
    format!("SELECT COUNT(*) FROM {} WHERE {predicate};", table::<T>())
}

pub(crate) fn select_sql<T: Entity>(predicate: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {predicate} ORDER BY {} ASC;",
        column_list::<T>(),
        table::<T>(),
        quote_ident(T::ID_COLUMN)
    )
}

pub(crate) fn delete_sql<T: Entity>(predicate: &str) -> String {
    format!("DELETE FROM {} WHERE {predicate};", table::<T>())
}

/// Insert statement binding `COLUMNS`, preceded by the key when `with_id`.
pub(crate) fn insert_sql<T: Entity>(with_id: bool) -> String {
    let columns: Vec<&str> = if with_id {
        std::iter::once(T::ID_COLUMN)
            .chain(T::COLUMNS.iter().copied())
            .collect()
    } else {
        T::COLUMNS.to_vec()
    };

    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES;", table::<T>());
    }

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table::<T>(),
        columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", "),
        placeholders(columns.len())
    )
}

/// Insert-or-update keyed on `ID_COLUMN`, binding the key then `COLUMNS`.
pub(crate) fn upsert_sql<T: Entity>() -> String {
    let conflict_action = if T::COLUMNS.is_empty() {
        "NOTHING".to_string()
    } else {
        let assignments = T::COLUMNS
            .iter()
            .map(|column| {
                let quoted = quote_ident(column);
                format!("{quoted} = excluded.{quoted}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE SET {assignments}")
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO {conflict_action};",
        table::<T>(),
        column_list::<T>(),
        placeholders(T::COLUMNS.len() + 1),
        quote_ident(T::ID_COLUMN)
    )
}

/// Partial update of `keys`, scoped by `"id" = ?` bound last.
pub(crate) fn update_sql<'a, T: Entity>(keys: impl Iterator<Item = &'a str>) -> String {
    let assignments = keys
        .map(|key| format!("{} = ?", quote_ident(key)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {assignments} WHERE {};",
        table::<T>(),
        id_eq::<T>()
    )
}
