//! Closed set of primary-key kinds.
//!
//! # Invariants
//! - Only signed/unsigned integers and `String` implement [`Identifier`].
//! - The trait is sealed; downstream crates cannot widen the set.

use rusqlite::types::ToSql;
use std::fmt::{Debug, Display};

mod sealed {
    pub trait Sealed {}
}

/// Primary-key value accepted by repositories.
///
/// Implemented for `i8`, `i16`, `i32`, `i64`, `isize`, `u8`, `u16`, `u32`,
/// `u64`, `usize` and `String`.
pub trait Identifier: ToSql + Clone + Default + PartialEq + Debug + Display + sealed::Sealed {
    /// Whether SQLite may assign this key from the table rowid on insert.
    const AUTO_INCREMENT: bool;

    /// Returns `true` for the zero value (`0` or `""`), meaning "no key yet".
    fn is_unset(&self) -> bool;

    /// Converts a rowid assigned by SQLite into this identifier kind.
    ///
    /// Returns `None` when the kind is not integral or the rowid does not fit.
    fn from_rowid(rowid: i64) -> Option<Self>;
}

macro_rules! integer_identifier {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Identifier for $ty {
                const AUTO_INCREMENT: bool = true;

                fn is_unset(&self) -> bool {
                    *self == 0
                }

                fn from_rowid(rowid: i64) -> Option<Self> {
                    <$ty>::try_from(rowid).ok()
                }
            }
        )*
    };
}

integer_identifier!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl sealed::Sealed for String {}

impl Identifier for String {
    const AUTO_INCREMENT: bool = false;

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn from_rowid(_rowid: i64) -> Option<Self> {
        None
    }
}
