//! Partial-update payloads and their type check.
//!
//! # Responsibility
//! - Carry column-name to value pairs for `updates`.
//! - Record the runtime kind of every inserted value.
//!
//! # Invariants
//! - `valid()` inspects every entry before any statement runs.
//! - One disallowed value rejects the whole map; nothing is applied.
//! - Iteration order is sorted by key, so the first reported offender is
//!   deterministic.

use crate::datatypes::{Date, Json, JsonSlice, JsonType, Time};
use rusqlite::types::{Null, ToSql, ToSqlOutput};
use std::collections::btree_map::{self, BTreeMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A single update value tagged with its runtime kind.
///
/// Integer, text and `datatypes` variants are accepted by
/// [`UpdateMap::valid`]. Floating-point, boolean, byte and null variants
/// exist so callers can express them, but they are rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    Text(String),
    Json(Json),
    Date(Date),
    Time(Time),
    JsonSlice(JsonSlice),
    JsonType(JsonType),
    F32(f32),
    F64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Null,
}

impl FieldValue {
    /// Returns the Rust type name of the carried value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::Isize(_) => "isize",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::Usize(_) => "usize",
            Self::Text(_) => "String",
            Self::Json(_) => "Json",
            Self::Date(_) => "Date",
            Self::Time(_) => "Time",
            Self::JsonSlice(_) => "JsonSlice",
            Self::JsonType(_) => "JsonType",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "Vec<u8>",
            Self::Null => "null",
        }
    }

    /// Whether this kind may be written through `updates`.
    pub fn is_allowed(&self) -> bool {
        !matches!(
            self,
            Self::F32(_) | Self::F64(_) | Self::Bool(_) | Self::Bytes(_) | Self::Null
        )
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Isize(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::Usize(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Json(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{v}"),
            Self::JsonSlice(v) => write!(f, "{v}"),
            Self::JsonType(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Bytes(v) => write!(f, "{v:?}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::I8(v) => v.to_sql(),
            Self::I16(v) => v.to_sql(),
            Self::I32(v) => v.to_sql(),
            Self::I64(v) => v.to_sql(),
            Self::Isize(v) => v.to_sql(),
            Self::U8(v) => v.to_sql(),
            Self::U16(v) => v.to_sql(),
            Self::U32(v) => v.to_sql(),
            Self::U64(v) => v.to_sql(),
            Self::Usize(v) => v.to_sql(),
            Self::Text(v) => v.to_sql(),
            Self::Json(v) => v.to_sql(),
            Self::Date(v) => v.to_sql(),
            Self::Time(v) => v.to_sql(),
            Self::JsonSlice(v) => v.to_sql(),
            Self::JsonType(v) => v.to_sql(),
            Self::F32(v) => Ok(ToSqlOutput::from(f64::from(*v))),
            Self::F64(v) => v.to_sql(),
            Self::Bool(v) => v.to_sql(),
            Self::Bytes(v) => v.to_sql(),
            Self::Null => Ok(ToSqlOutput::from(Null)),
        }
    }
}

macro_rules! field_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

field_value_from!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    String => Text,
    Json => Json,
    Date => Date,
    Time => Time,
    JsonSlice => JsonSlice,
    JsonType => JsonType,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    Vec<u8> => Bytes,
);

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Rejection raised by [`UpdateMap::valid`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValidationError {
    InvalidType {
        key: String,
        value: String,
        type_name: &'static str,
    },
}

impl Display for UpdateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidType {
                key,
                value,
                type_name,
            } => write!(
                f,
                "invalid type for key '{key}': {value} (type: {type_name})"
            ),
        }
    }
}

impl Error for UpdateValidationError {}

/// Column-name to value mapping applied by `updates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMap {
    entries: BTreeMap<String, FieldValue>,
}

impl UpdateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces one entry, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style [`UpdateMap::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.entries.iter()
    }

    /// Checks every value against the allowed kinds.
    ///
    /// # Errors
    /// - Returns [`UpdateValidationError::InvalidType`] for the first key
    ///   (in key order) whose value kind is not allowed.
    pub fn valid(&self) -> Result<(), UpdateValidationError> {
        match self.entries.iter().find(|(_, value)| !value.is_allowed()) {
            Some((key, value)) => Err(UpdateValidationError::InvalidType {
                key: key.clone(),
                value: value.to_string(),
                type_name: value.type_name(),
            }),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for UpdateMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<FieldValue>, const N: usize> From<[(K, V); N]> for UpdateMap {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a UpdateMap {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, UpdateMap, UpdateValidationError};
    use crate::datatypes::{Date, Json, JsonSlice, JsonType, Time};
    use serde_json::json;

    #[test]
    fn accepts_every_allowed_kind() {
        let map = UpdateMap::new()
            .with("a", 1_i8)
            .with("b", 2_i16)
            .with("c", 3_i32)
            .with("d", 4_i64)
            .with("e", 5_isize)
            .with("f", 6_u8)
            .with("g", 7_u16)
            .with("h", 8_u32)
            .with("i", 9_u64)
            .with("j", 10_usize)
            .with("k", "text")
            .with("l", Json(json!({ "x": 1 })))
            .with("m", Date::from_ymd(2024, 1, 2).unwrap())
            .with("n", Time::from_hms(3, 4, 5).unwrap())
            .with("o", JsonSlice(vec![json!(1)]))
            .with("p", JsonType::new(json!("v")));

        assert_eq!(map.len(), 16);
        assert_eq!(map.valid(), Ok(()));
    }

    #[test]
    fn empty_map_is_valid() {
        assert!(UpdateMap::new().valid().is_ok());
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn float_value_is_rejected_with_key_value_and_type() {
        let map = UpdateMap::from([("Name", 3.14_f64)]);

        let err = map.valid().unwrap_err();
        assert_eq!(
            err,
            UpdateValidationError::InvalidType {
                key: "Name".to_string(),
                value: "3.14".to_string(),
                type_name: "f64",
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid type for key 'Name': 3.14 (type: f64)"
        );
    }

    #[test]
    fn one_bad_value_rejects_the_whole_map() {
        let map = UpdateMap::new()
            .with("active", true)
            .with("name", "ok")
            .with("size", 10_u32);

        let err = map.valid().unwrap_err();
        assert!(err.to_string().contains("'active'"));
        assert!(err.to_string().contains("bool"));
    }

    #[test]
    fn none_becomes_null_and_is_rejected() {
        let mut map = UpdateMap::new();
        map.insert("note", Option::<String>::None);

        assert_eq!(map.get("note"), Some(&FieldValue::Null));
        assert!(map.valid().is_err());
    }

    #[test]
    fn insert_replaces_previous_value() {
        let mut map = UpdateMap::new();
        assert!(map.insert("name", "a").is_none());
        assert_eq!(map.insert("name", "b"), Some(FieldValue::Text("a".into())));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["name"]);
    }
}
