#![allow(dead_code)]

use gord_core::db::migrations::{apply_migrations, Migration};
use gord_core::db::open_db_in_memory;
use gord_core::{Date, Entity, Json, JsonSlice, JsonType, Time};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        1,
        "CREATE TABLE widgets (
            id INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            size INTEGER NOT NULL DEFAULT 0 CHECK (size >= 0)
        );",
    ),
    Migration::new(
        2,
        "CREATE TABLE tags (
            id TEXT PRIMARY KEY NOT NULL,
            label TEXT NOT NULL
        );
        CREATE TABLE tiny_rows (
            id INTEGER PRIMARY KEY NOT NULL,
            note TEXT NOT NULL
        );",
    ),
    Migration::new(
        3,
        "CREATE TABLE events (
            id INTEGER PRIMARY KEY NOT NULL,
            day TEXT NOT NULL,
            starts_at TEXT NOT NULL,
            payload TEXT NOT NULL,
            labels TEXT NOT NULL,
            meta TEXT NOT NULL
        );",
    ),
];

pub fn open_test_db() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    apply_migrations(&mut conn, MIGRATIONS).unwrap();
    conn
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Widget {
    pub id: i64,
    pub name: String,
    pub size: i64,
}

impl Widget {
    pub fn new(name: &str, size: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            size,
        }
    }

    pub fn with_id(id: i64, name: &str, size: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            size,
        }
    }
}

impl Entity for Widget {
    type Id = i64;
    const TABLE: &'static str = "widgets";
    const COLUMNS: &'static [&'static str] = &["name", "size"];

    fn id(&self) -> &i64 {
        &self.id
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![&self.name, &self.size]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            size: row.get("size")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

impl Entity for Tag {
    type Id = String;
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static [&'static str] = &["label"];

    fn id(&self) -> &String {
        &self.id
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![&self.label]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            label: row.get("label")?,
        })
    }
}

/// Entity keyed by `u8`, used to exercise rowid range checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TinyRow {
    pub id: u8,
    pub note: String,
}

impl Entity for TinyRow {
    type Id = u8;
    const TABLE: &'static str = "tiny_rows";
    const COLUMNS: &'static [&'static str] = &["note"];

    fn id(&self) -> &u8 {
        &self.id
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![&self.note]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            note: row.get("note")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub owner: String,
    pub priority: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub id: u32,
    pub day: Date,
    pub starts_at: Time,
    pub payload: Json,
    pub labels: JsonSlice<String>,
    pub meta: JsonType<EventMeta>,
}

impl Entity for Event {
    type Id = u32;
    const TABLE: &'static str = "events";
    const COLUMNS: &'static [&'static str] = &["day", "starts_at", "payload", "labels", "meta"];

    fn id(&self) -> &u32 {
        &self.id
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.day,
            &self.starts_at,
            &self.payload,
            &self.labels,
            &self.meta,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            day: row.get("day")?,
            starts_at: row.get("starts_at")?,
            payload: row.get("payload")?,
            labels: row.get("labels")?,
            meta: row.get("meta")?,
        })
    }
}
