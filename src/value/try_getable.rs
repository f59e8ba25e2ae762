//! TryGetable trait for safe value extraction
//!
//! Extracts Rust values from `sea_query::Value` with errors that tell a null
//! apart from a type mismatch.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch {
        expected: String,
        actual: String,
    },
    /// Value conversion failed (e.g., overflow)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// ```rust
/// use lifeguard_activequery::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(Value::Int(Some(42)));
/// assert_eq!(result, Ok(42));
///
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(Value::Int(None));
/// assert!(matches!(result, Err(ValueExtractionError::NullValue)));
/// ```
pub trait TryGetable: Sized {
    /// Try to extract a value from `sea_query::Value`
    fn try_get(value: Value) -> Result<Self, ValueExtractionError>;
}

/// NUMERIC columns arrive as decimal text.
fn numeric_text(text: &str) -> Option<Decimal> {
    text.parse::<Decimal>().ok()
}

fn mismatch(expected: &str, value: &Value) -> ValueExtractionError {
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{:?}", value),
    }
}

impl TryGetable for bool {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bool(Some(v)) => Ok(v),
            Value::Bool(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Bool", &value)),
        }
    }
}

impl TryGetable for i32 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Int(Some(v)) => Ok(v),
            Value::SmallInt(Some(v)) => Ok(i32::from(v)),
            Value::TinyInt(Some(v)) => Ok(i32::from(v)),
            Value::BigInt(Some(v)) => i32::try_from(v).map_err(|_| {
                ValueExtractionError::ConversionError(format!("{v} does not fit in i32"))
            }),
            Value::Int(None) | Value::SmallInt(None) | Value::TinyInt(None) | Value::BigInt(None) => {
                Err(ValueExtractionError::NullValue)
            }
            _ => Err(mismatch("Int", &value)),
        }
    }
}

impl TryGetable for i64 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::BigInt(Some(v)) => Ok(v),
            Value::Int(Some(v)) => Ok(i64::from(v)),
            Value::SmallInt(Some(v)) => Ok(i64::from(v)),
            Value::TinyInt(Some(v)) => Ok(i64::from(v)),
            Value::Unsigned(Some(v)) => Ok(i64::from(v)),
            Value::String(Some(ref text)) => match numeric_text(text) {
                Some(d) if d.fract().is_zero() => d.to_i64().ok_or_else(|| {
                    ValueExtractionError::ConversionError(format!("{d} does not fit in i64"))
                }),
                _ => Err(mismatch("BigInt", &value)),
            },
            Value::BigInt(None)
            | Value::Int(None)
            | Value::SmallInt(None)
            | Value::TinyInt(None)
            | Value::String(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("BigInt", &value)),
        }
    }
}

impl TryGetable for f64 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Double(Some(v)) => Ok(v),
            Value::Float(Some(v)) => Ok(f64::from(v)),
            Value::Int(Some(v)) => Ok(f64::from(v)),
            Value::SmallInt(Some(v)) => Ok(f64::from(v)),
            // Aggregates over int columns come back as int8
            Value::BigInt(Some(v)) => Ok(v as f64),
            Value::String(Some(ref text)) => numeric_text(text)
                .and_then(|d| d.to_f64())
                .ok_or_else(|| mismatch("Double", &value)),
            Value::Double(None)
            | Value::Float(None)
            | Value::Int(None)
            | Value::SmallInt(None)
            | Value::BigInt(None)
            | Value::String(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Double", &value)),
        }
    }
}

impl TryGetable for Decimal {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(ref text)) => {
                numeric_text(text).ok_or_else(|| mismatch("Decimal", &value))
            }
            Value::Int(Some(v)) => Ok(Decimal::from(v)),
            Value::BigInt(Some(v)) => Ok(Decimal::from(v)),
            Value::SmallInt(Some(v)) => Ok(Decimal::from(v)),
            Value::Double(Some(v)) => Decimal::try_from(v)
                .map_err(|e| ValueExtractionError::ConversionError(e.to_string())),
            Value::String(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::SmallInt(None)
            | Value::Double(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Decimal", &value)),
        }
    }
}

impl TryGetable for String {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(v)) => Ok(v),
            Value::Char(Some(c)) => Ok(c.to_string()),
            Value::String(None) | Value::Char(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("String", &value)),
        }
    }
}

impl TryGetable for serde_json::Value {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(v)) => Ok(*v),
            Value::Json(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Json", &value)),
        }
    }
}

impl<T: TryGetable> TryGetable for Option<T> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match T::try_get(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueExtractionError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
