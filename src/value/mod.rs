//! Value extraction for decoded rows
//!
//! Rows carry `sea_query::Value`s; [`TryGetable`] turns them back into Rust
//! types with errors that distinguish SQL `NULL` from a type mismatch.

pub mod try_getable;

pub use try_getable::{TryGetable, ValueExtractionError};

use sea_query::Value;

/// Stable text key for a value, used to match link columns across rows.
///
/// Numeric widths collapse to the same key (`Int(1)` and `BigInt(1)` both map
/// to `"1"`) because foreign keys and primary keys are often declared with
/// different integer types. `NULL` has no key.
pub fn value_key(value: &Value) -> Option<String> {
    match value {
        Value::Bool(Some(b)) => Some(b.to_string()),
        Value::TinyInt(Some(i)) => Some(i.to_string()),
        Value::SmallInt(Some(i)) => Some(i.to_string()),
        Value::Int(Some(i)) => Some(i.to_string()),
        Value::BigInt(Some(i)) => Some(i.to_string()),
        Value::TinyUnsigned(Some(u)) => Some(u.to_string()),
        Value::SmallUnsigned(Some(u)) => Some(u.to_string()),
        Value::Unsigned(Some(u)) => Some(u.to_string()),
        Value::BigUnsigned(Some(u)) => Some(u.to_string()),
        Value::Float(Some(f)) => Some(f.to_string()),
        Value::Double(Some(d)) => Some(d.to_string()),
        Value::String(Some(s)) => Some(s.clone()),
        Value::Char(Some(c)) => Some(c.to_string()),
        Value::Bytes(Some(b)) => Some(b.iter().map(|byte| format!("{byte:02x}")).collect()),
        Value::Json(Some(j)) => Some(j.to_string()),
        _ => None,
    }
}

/// Whether the value is SQL `NULL`, whatever its declared type.
pub fn is_null_value(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
    )
}

/// Convert a value to JSON, used by [`Row::decode`](crate::Row::decode).
pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Bool(Some(b)) => Json::Bool(*b),
        Value::TinyInt(Some(i)) => Json::from(*i),
        Value::SmallInt(Some(i)) => Json::from(*i),
        Value::Int(Some(i)) => Json::from(*i),
        Value::BigInt(Some(i)) => Json::from(*i),
        Value::TinyUnsigned(Some(u)) => Json::from(*u),
        Value::SmallUnsigned(Some(u)) => Json::from(*u),
        Value::Unsigned(Some(u)) => Json::from(*u),
        Value::BigUnsigned(Some(u)) => Json::from(*u),
        Value::Float(Some(f)) => Json::from(f64::from(*f)),
        Value::Double(Some(d)) => Json::from(*d),
        Value::String(Some(s)) => Json::String(s.clone()),
        Value::Char(Some(c)) => Json::String(c.to_string()),
        Value::Bytes(Some(b)) => Json::from(b.clone()),
        Value::Json(Some(j)) => (**j).clone(),
        _ => Json::Null,
    }
}
