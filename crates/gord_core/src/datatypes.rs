//! Structured column types stored as SQLite TEXT.
//!
//! # Responsibility
//! - Provide JSON, date and time-of-day wrappers usable as entity fields.
//! - Provide the structured kinds accepted inside an `UpdateMap`.
//!
//! # Invariants
//! - `Date` is persisted as `YYYY-MM-DD`.
//! - `Time` is persisted as `HH:MM:SS` with an optional fraction.
//! - JSON wrappers are persisted as compact JSON text and read back from
//!   either TEXT or BLOB columns.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Untyped JSON document column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json(pub serde_json::Value);

impl Json {
    /// Parses raw JSON text.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Json {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl Display for Json {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Json {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Json {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decode_json(value).map(Self)
    }
}

/// Calendar date column without time zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(pub NaiveDate);

impl Date {
    /// Builds a date from year/month/day, `None` when out of range.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
}

impl From<NaiveDate> for Date {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl ToSql for Date {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Date {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        // Accept `YYYY-MM-DD HH:MM:SS` style values written by other tools.
        let date_part = text.get(..10).unwrap_or(text);
        NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map(Self)
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Time-of-day column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(pub NaiveTime);

impl Time {
    /// Builds a time from hour/minute/second, `None` when out of range.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Self)
    }
}

impl From<NaiveTime> for Time {
    fn from(value: NaiveTime) -> Self {
        Self(value)
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TIME_FORMAT))
    }
}

impl ToSql for Time {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Time {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        NaiveTime::parse_from_str(value.as_str()?, TIME_FORMAT)
            .map(Self)
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Homogeneous list stored as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSlice<T = serde_json::Value>(pub Vec<T>);

impl<T> Default for JsonSlice<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> From<Vec<T>> for JsonSlice<T> {
    fn from(value: Vec<T>) -> Self {
        Self(value)
    }
}

impl<T: Serialize> Display for JsonSlice<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_json(f, &self.0)
    }
}

impl<T: Serialize> ToSql for JsonSlice<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        encode_json(&self.0)
    }
}

impl<T: DeserializeOwned> FromSql for JsonSlice<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decode_json(value).map(Self)
    }
}

/// Arbitrary serde value stored as a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonType<T = serde_json::Value>(pub T);

impl<T> JsonType<T> {
    pub fn new(data: T) -> Self {
        Self(data)
    }

    pub fn data(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> Display for JsonType<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_json(f, &self.0)
    }
}

impl<T: Serialize> ToSql for JsonType<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        encode_json(&self.0)
    }
}

impl<T: DeserializeOwned> FromSql for JsonType<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decode_json(value).map(Self)
    }
}

fn encode_json<T: Serialize + ?Sized>(value: &T) -> rusqlite::Result<ToSqlOutput<'static>> {
    serde_json::to_string(value)
        .map(ToSqlOutput::from)
        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
}

fn decode_json<T: DeserializeOwned>(value: ValueRef<'_>) -> FromSqlResult<T> {
    let bytes = match value {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes,
        _ => return Err(FromSqlError::InvalidType),
    };
    serde_json::from_slice(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))
}

fn write_json<T: Serialize + ?Sized>(f: &mut Formatter<'_>, value: &T) -> std::fmt::Result {
    let text = serde_json::to_string(value).map_err(|_| std::fmt::Error)?;
    f.write_str(&text)
}
