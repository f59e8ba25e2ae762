//! Decoded result rows.
//!
//! A [`Row`] is a column name → `sea_query::Value` mapping. Executors decode
//! driver rows into this shape and [`FromRow`](crate::FromRow) builds models
//! from it.

use crate::executor::LifeError;
use crate::value::{value_key, value_to_json, TryGetable};
use sea_query::Value;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// A single result row keyed by column name.
///
/// Rows loaded by eager loading of a nested path (`orders.items`) also carry
/// the rows of the deeper relations, see [`Row::related`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: BTreeMap<String, Value>,
    relations: BTreeMap<String, Vec<Row>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            relations: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Rows eager loaded for relation `name` of this row's entity.
    pub fn related(&self, name: &str) -> Option<&[Row]> {
        self.relations.get(name).map(Vec::as_slice)
    }

    pub fn set_related(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.relations.insert(name.into(), rows);
    }

    pub(crate) fn relations(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.relations.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Take the value of the first column, used for scalar results.
    pub fn into_first_value(self) -> Option<Value> {
        self.columns.into_values().next()
    }

    /// Extract a typed column value.
    ///
    /// # Errors
    ///
    /// `LifeError::ParseError` when the column is absent or the value cannot be
    /// converted to `T`.
    pub fn try_get<T: TryGetable>(&self, column: &str) -> Result<T, LifeError> {
        let value = self
            .columns
            .get(column)
            .cloned()
            .ok_or_else(|| LifeError::ParseError(format!("Column `{column}` not found in row")))?;
        T::try_get(value)
            .map_err(|e| LifeError::ParseError(format!("Column `{column}`: {e}")))
    }

    /// Deserialize the row into any `serde` type through its JSON form.
    ///
    /// # Errors
    ///
    /// `LifeError::ParseError` if the row does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, LifeError> {
        serde_json::from_value(self.to_json())
            .map_err(|e| LifeError::ParseError(format!("Failed to decode row: {e}")))
    }

    /// JSON object view of the row.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.columns
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        )
    }

    /// Composite key over `columns`, or `None` if any of them is missing or null.
    pub(crate) fn key_of<S: AsRef<str>>(&self, columns: &[S]) -> Option<String> {
        let mut parts = Vec::with_capacity(columns.len());
        for column in columns {
            parts.push(value_key(self.columns.get(column.as_ref())?)?);
        }
        Some(parts.join("\u{1f}"))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
