//! `LifeExecutor` module
//!
//! Provides the `LifeExecutor` trait that abstracts statement execution for
//! [`ActiveQuery`](crate::ActiveQuery). Executors return decoded [`Row`]s so the
//! query layer never touches driver row types.

use crate::row::Row;
use may_postgres::types::{ToSql, Type};
use may_postgres::{Client, Error as PostgresError};
use sea_query::Value;
use std::fmt;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// `LifeExecutor` error type
#[derive(Debug)]
pub enum LifeError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Query execution error
    QueryError(String),
    /// Row parsing/conversion error
    ParseError(String),
    /// Invalid relation or query configuration
    ConfigurationError(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for LifeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeError::PostgresError(e) => {
                write!(f, "PostgreSQL error: {e}")
            }
            LifeError::QueryError(s) => {
                write!(f, "Query error: {s}")
            }
            LifeError::ParseError(s) => {
                write!(f, "Parse error: {s}")
            }
            LifeError::ConfigurationError(s) => {
                write!(f, "Configuration error: {s}")
            }
            LifeError::Other(s) => {
                write!(f, "Execution error: {s}")
            }
        }
    }
}

impl std::error::Error for LifeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifeError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for LifeError {
    fn from(err: PostgresError) -> Self {
        LifeError::PostgresError(err)
    }
}

/// Trait for executing database operations
///
/// Implementations run a SQL string with positional parameters and hand back
/// decoded rows. Query building never depends on the concrete executor, so a
/// direct client, a pooled connection, or a test double can be used.
///
/// # Examples
///
/// ```no_run
/// use lifeguard_activequery::{LifeExecutor, LifeError, MayPostgresExecutor};
///
/// # fn example(executor: &MayPostgresExecutor) -> Result<(), LifeError> {
/// let rows = executor.query_all("SELECT id FROM customer", &[])?;
/// for row in &rows {
///     let id: i32 = row.try_get("id")?;
///     println!("customer {id}");
/// }
/// # Ok(())
/// # }
/// ```
pub trait LifeExecutor {
    /// Execute a SQL statement and return the number of rows affected
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the statement fails.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, LifeError>;

    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the query fails or a row cannot be decoded.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, LifeError>;

    /// Execute a query and return the first row, if any
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the query fails or the row cannot be decoded.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Option<Row>, LifeError> {
        Ok(self.query_all(query, params)?.into_iter().next())
    }
}

impl<T: LifeExecutor + ?Sized> LifeExecutor for &T {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, LifeError> {
        (**self).execute(query, params)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, LifeError> {
        (**self).query_all(query, params)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Option<Row>, LifeError> {
        (**self).query_one(query, params)
    }
}

/// Implementation of `LifeExecutor` for `may_postgres::Client`
///
/// The client is supplied by the caller; opening and pooling connections is
/// left to the Lifeguard pool.
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client
    pub fn into_client(self) -> Client {
        self.client
    }
}

impl LifeExecutor for MayPostgresExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, LifeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        self.client.execute(query, params).map_err(LifeError::PostgresError)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, LifeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let rows = self.client.query(query, params)?;
        rows.iter().map(decode_pg_row).collect()
    }
}

/// Decode a `may_postgres` row into a column → value [`Row`].
///
/// Temporal, UUID and NUMERIC columns are carried as strings; anything without a
/// mapping is read as text and reported as a parse error if that fails.
fn decode_pg_row(row: &may_postgres::Row) -> Result<Row, LifeError> {
    let mut decoded = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = if *ty == Type::BOOL {
            Value::Bool(row.try_get::<_, Option<bool>>(idx)?)
        } else if *ty == Type::INT2 {
            Value::SmallInt(row.try_get::<_, Option<i16>>(idx)?)
        } else if *ty == Type::INT4 {
            Value::Int(row.try_get::<_, Option<i32>>(idx)?)
        } else if *ty == Type::INT8 {
            Value::BigInt(row.try_get::<_, Option<i64>>(idx)?)
        } else if *ty == Type::FLOAT4 {
            Value::Float(row.try_get::<_, Option<f32>>(idx)?)
        } else if *ty == Type::FLOAT8 {
            Value::Double(row.try_get::<_, Option<f64>>(idx)?)
        } else if *ty == Type::NUMERIC {
            // Kept as exact decimal text; `TryGetable` parses it back
            Value::String(
                row.try_get::<_, Option<rust_decimal::Decimal>>(idx)?
                    .map(|d| d.to_string()),
            )
        } else if *ty == Type::BYTEA {
            Value::Bytes(row.try_get::<_, Option<Vec<u8>>>(idx)?)
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Value::Json(row.try_get::<_, Option<serde_json::Value>>(idx)?.map(Box::new))
        } else if *ty == Type::TIMESTAMP {
            Value::String(
                row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
                    .map(|ts| ts.to_string()),
            )
        } else if *ty == Type::TIMESTAMPTZ {
            Value::String(
                row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
                    .map(|ts| ts.to_rfc3339()),
            )
        } else if *ty == Type::DATE {
            Value::String(
                row.try_get::<_, Option<chrono::NaiveDate>>(idx)?
                    .map(|d| d.to_string()),
            )
        } else if *ty == Type::UUID {
            Value::String(
                row.try_get::<_, Option<uuid::Uuid>>(idx)?
                    .map(|u| u.to_string()),
            )
        } else {
            let text = row.try_get::<_, Option<String>>(idx).map_err(|e| {
                LifeError::ParseError(format!(
                    "Unsupported type {} for column {}: {e}",
                    ty,
                    column.name()
                ))
            })?;
            Value::String(text)
        };
        decoded.insert(column.name(), value);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockExecutor;

    #[test]
    fn test_life_error_display() {
        let err = LifeError::QueryError("test error".to_string());
        assert!(err.to_string().contains("Query error"));
    }

    #[test]
    fn test_life_error_all_variants() {
        let err = LifeError::ParseError("test".to_string());
        assert!(err.to_string().contains("Parse error"));

        let err = LifeError::ConfigurationError("no relation".to_string());
        assert_eq!(err.to_string(), "Configuration error: no relation");

        let err = LifeError::Other("test".to_string());
        assert!(err.to_string().contains("Execution error"));
    }

    #[test]
    fn test_query_one_defaults_to_first_row() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![
            Row::from_pairs([("id", Value::Int(Some(1)))]),
            Row::from_pairs([("id", Value::Int(Some(2)))]),
        ]);

        let row = executor.query_one("SELECT id FROM t", &[]).unwrap();
        assert_eq!(row.unwrap().get("id"), Some(&Value::Int(Some(1))));

        // Queue is drained, so the next call sees an empty result
        assert!(executor.query_one("SELECT id FROM t", &[]).unwrap().is_none());
    }

    #[test]
    fn test_executor_by_reference() {
        fn run<E: LifeExecutor>(executor: E) -> usize {
            executor.query_all("SELECT 1", &[]).unwrap().len()
        }

        let executor = MockExecutor::new();
        executor.push_rows(vec![Row::new()]);
        assert_eq!(run(&executor), 1);
        assert_eq!(executor.captured_sql(), vec!["SELECT 1".to_string()]);
    }
}
