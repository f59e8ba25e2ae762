//! Test doubles for code that takes a [`LifeExecutor`].
//!
//! [`MockExecutor`] captures every statement with its parameter count and
//! answers queries from a queue of prepared row sets. An empty queue answers
//! with no rows.

use crate::executor::{LifeError, LifeExecutor};
use crate::row::Row;
use may_postgres::types::ToSql;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mock executor that captures SQL and parameter counts for verification
#[derive(Debug, Default)]
pub struct MockExecutor {
    captured_sql: Mutex<Vec<String>>,
    captured_param_counts: Mutex<Vec<usize>>,
    results: Mutex<VecDeque<Result<Vec<Row>, String>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        locked(&self.results).push_back(Ok(rows));
    }

    /// Make the next query fail with `LifeError::QueryError(message)`.
    pub fn push_error(&self, message: impl Into<String>) {
        locked(&self.results).push_back(Err(message.into()));
    }

    pub fn captured_sql(&self) -> Vec<String> {
        locked(&self.captured_sql).clone()
    }

    pub fn captured_param_counts(&self) -> Vec<usize> {
        locked(&self.captured_param_counts).clone()
    }

    pub fn clear(&self) {
        locked(&self.captured_sql).clear();
        locked(&self.captured_param_counts).clear();
        locked(&self.results).clear();
    }

    fn capture(&self, query: &str, params: &[&dyn ToSql]) {
        locked(&self.captured_sql).push(query.to_string());
        locked(&self.captured_param_counts).push(params.len());
    }
}

impl LifeExecutor for MockExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, LifeError> {
        self.capture(query, params);
        Ok(0)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, LifeError> {
        self.capture(query, params);
        match locked(&self.results).pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(LifeError::QueryError(message)),
            None => Ok(Vec::new()),
        }
    }
}
