//! Generic CRUD repositories for SQLite-backed entities.
//!
//! Callers describe a table with [`Entity`], open a connection with
//! [`db::open_db`] (or bring their own), and wrap it in a
//! [`SqliteRepository`].

pub mod config;
pub mod datatypes;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, CoreConfig, DbConfig, LogConfig};
pub use datatypes::{Date, Json, JsonSlice, JsonType, Time};
pub use logging::{default_log_level, init_logging, logging_status, LogInitError};
pub use model::entity::Entity;
pub use model::identifier::Identifier;
pub use repo::crud_repo::{CrudRepository, RepoError, RepoResult, SqliteRepository};
pub use repo::update_map::{FieldValue, UpdateMap, UpdateValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
