//! Entity and identifier contracts shared by every repository.
//!
//! # Responsibility
//! - Describe how a caller-defined record maps onto one SQLite table.
//! - Restrict primary-key values to a closed set of scalar kinds.
//!
//! # Invariants
//! - Every entity is keyed by a single identifier column (`id` by default).
//! - `T::default()` is the zero value returned for absent rows.

pub mod entity;
pub mod identifier;
