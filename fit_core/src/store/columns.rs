//! Column encodings shared by the record mappings.
//!
//! Ids are stored as UUID text, instants as UTC milliseconds and enums as
//! their lowercase names.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use std::str::FromStr;
use uuid::Uuid;

pub fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn invalid(idx: usize, ty: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, message.into())
}

pub fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| invalid(idx, Type::Text, format!("invalid id '{}': {}", text, e)))
}

pub fn instant_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| invalid(idx, Type::Integer, format!("timestamp out of range: {}", ms)))
}

pub fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| invalid(idx, Type::Text, format!("invalid date '{}': {}", s, e)))
    })
    .transpose()
}

/// Parse an enum column through its `FromStr` impl
pub fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let text: String = row.get(idx)?;
    text.parse::<T>()
        .map_err(|e| invalid(idx, Type::Text, e.to_string()))
}

pub fn json_at<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| invalid(idx, Type::Text, e.to_string()))
}
