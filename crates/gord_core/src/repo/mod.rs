//! Generic repository layer over SQLite.
//!
//! # Responsibility
//! - Define the CRUD contract shared by every entity type.
//! - Validate partial-update payloads before they reach the database.
//!
//! # Invariants
//! - Table and column names are always quoted; values are always bound.
//! - Repositories hold no state beyond the borrowed connection.

pub mod crud_repo;
mod sql;
pub mod update_map;
