//! Query execution for `ActiveQuery`.
//!
//! Statements are built into a [`Command`] (SQL plus values) with the backend
//! picked by the configured [`Dialect`], and parameters are converted with
//! `with_converted_params` before reaching the executor.

use crate::config::Dialect;
use crate::executor::{LifeError, LifeExecutor};
use crate::query::active::{lookup, ActiveQuery};
use crate::query::base::Query;
use crate::query::iden::name;
use crate::query::traits::{FromRow, LifeModelTrait};
use crate::query::value_conversion::with_converted_params;
use crate::relation::eager::load_eager;
use crate::row::Row;
use crate::value::{is_null_value, TryGetable};
use sea_query::{
    Expr, MysqlQueryBuilder, PostgresQueryBuilder, QueryBuilder, SelectStatement, SqliteQueryBuilder,
    Value, Values,
};
use std::collections::HashSet;

/// Built SQL with its positional values, ready to run on an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub sql: String,
    pub values: Values,
}

impl Command {
    pub(crate) fn from_statement(statement: &SelectStatement, dialect: Dialect) -> Self {
        let (sql, values) = match dialect {
            Dialect::Postgres => statement.build(PostgresQueryBuilder),
            Dialect::Mysql => statement.build(MysqlQueryBuilder),
            Dialect::Sqlite => statement.build(SqliteQueryBuilder),
        };
        Self { sql, values }
    }

    pub(crate) fn from_query(query: &Query, dialect: Dialect) -> Result<Self, LifeError> {
        Ok(Self::from_statement(&query.to_statement()?, dialect))
    }

    pub fn query_all<X: LifeExecutor>(&self, executor: &X) -> Result<Vec<Row>, LifeError> {
        with_converted_params(&self.values, |params| executor.query_all(&self.sql, params))
    }

    pub fn query_one<X: LifeExecutor>(&self, executor: &X) -> Result<Option<Row>, LifeError> {
        with_converted_params(&self.values, |params| executor.query_one(&self.sql, params))
    }

    /// First column of the first row.
    pub fn query_scalar<X: LifeExecutor>(&self, executor: &X) -> Result<Option<Value>, LifeError> {
        Ok(self.query_one(executor)?.and_then(Row::into_first_value))
    }
}

/// Executable plan produced by [`ActiveQuery::prepare`].
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub statement: SelectStatement,
    pub sql: String,
    pub values: Values,
}

impl<E> ActiveQuery<E>
where
    E: LifeModelTrait,
{
    /// Resolve relations and build the statement with `builder`.
    ///
    /// # Errors
    ///
    /// `LifeError::ConfigurationError` for unknown relations in `join_with`
    /// or a broken lazy-loading link, `LifeError::QueryError` for unbound
    /// raw parameters.
    pub fn prepare<B: QueryBuilder>(&self, builder: B) -> Result<PreparedQuery, LifeError> {
        let statement = self.build_query()?.to_statement()?;
        let (sql, values) = statement.build(builder);
        Ok(PreparedQuery { statement, sql, values })
    }

    /// Build the command for the configured dialect.
    pub fn create_command(&self) -> Result<Command, LifeError> {
        let command = Command::from_query(&self.build_query()?, self.config.dialect)?;
        self.log_command(&command);
        Ok(command)
    }

    fn log_command(&self, command: &Command) {
        if self.config.log_statements {
            log::debug!("ActiveQuery<{}>: {}", std::any::type_name::<E>(), command.sql);
        }
    }

    /// Execute and return all models, with eager relations loaded.
    ///
    /// # Errors
    ///
    /// Propagates executor errors and row parsing failures.
    pub fn all<X: LifeExecutor>(&self, executor: &X) -> Result<Vec<E::Model>, LifeError> {
        let rows = self.create_command()?.query_all(executor)?;
        self.populate_with(rows, executor)
    }

    /// Execute and return the first model, or `None` for an empty result.
    ///
    /// The statement is not limited; only the first row is read.
    pub fn one<X: LifeExecutor>(&self, executor: &X) -> Result<Option<E::Model>, LifeError> {
        match self.create_command()?.query_one(executor)? {
            Some(row) => Ok(self.populate_with(vec![row], executor)?.into_iter().next()),
            None => Ok(None),
        }
    }

    /// Build models from rows without touching the database.
    ///
    /// When `join_with` is set, rows repeated by a has-many join are
    /// collapsed by primary key; rows without a primary key are kept.
    pub fn populate(&self, rows: &[Row]) -> Result<Vec<E::Model>, LifeError> {
        self.unique_rows(rows)
            .into_iter()
            .map(<E::Model as FromRow>::from_row)
            .collect()
    }

    fn populate_with<X: LifeExecutor>(&self, rows: Vec<Row>, executor: &X) -> Result<Vec<E::Model>, LifeError> {
        let rows: Vec<Row> = self.unique_rows(&rows).into_iter().cloned().collect();
        let mut models = rows
            .iter()
            .map(<E::Model as FromRow>::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let eager = self.eager_relations();
        if !eager.is_empty() && !models.is_empty() {
            load_eager(lookup::<E>, &eager, &rows, &mut models, executor, &self.config)?;
        }
        Ok(models)
    }

    fn unique_rows<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        if self.join_with.is_empty() {
            return rows.iter().collect();
        }
        let primary_key = E::default().primary_key();
        let mut seen = HashSet::new();
        rows.iter()
            .filter(|row| match row.key_of(primary_key) {
                Some(key) => seen.insert(key),
                None => true,
            })
            .collect()
    }

    /// Select only `expr` and return the first column of the first row.
    ///
    /// Ordering and paging are dropped. With `distinct` or `group_by` the
    /// query is wrapped as `SELECT expr FROM (query) c` so the expression
    /// sees the grouped rows. Returns `default` when no row comes back.
    pub fn query_scalar<X: LifeExecutor>(
        &self,
        expr: &str,
        default: Value,
        executor: &X,
    ) -> Result<Value, LifeError> {
        let mut query = self.build_query()?;
        let command = if query.distinct || !query.group_by.is_empty() {
            let mut outer = SelectStatement::default();
            outer
                .expr(Expr::cust(expr.to_string()))
                .from_subquery(query.to_statement()?, name("c"));
            Command::from_statement(&outer, self.config.dialect)
        } else {
            query.select = vec![expr.to_string()];
            query.order_by.clear();
            query.limit = None;
            query.offset = None;
            Command::from_query(&query, self.config.dialect)?
        };
        self.log_command(&command);
        Ok(command.query_scalar(executor)?.unwrap_or(default))
    }

    /// Number of matching rows.
    pub fn count<X: LifeExecutor>(&self, executor: &X) -> Result<i64, LifeError> {
        let value = self.query_scalar("COUNT(*)", Value::BigInt(Some(0)), executor)?;
        i64::try_get(value).map_err(|e| LifeError::ParseError(format!("COUNT(*): {e}")))
    }

    /// Whether at least one row matches.
    pub fn exists<X: LifeExecutor>(&self, executor: &X) -> Result<bool, LifeError> {
        let mut query = self.build_query()?;
        query.select = vec!["1".to_string()];
        query.order_by.clear();
        query.offset = None;
        query.limit = Some(1);
        let command = Command::from_query(&query, self.config.dialect)?;
        self.log_command(&command);
        Ok(command.query_one(executor)?.is_some())
    }

    pub fn sum<T: TryGetable, X: LifeExecutor>(&self, column: &str, executor: &X) -> Result<Option<T>, LifeError> {
        self.aggregate("SUM", column, executor)
    }

    pub fn min<T: TryGetable, X: LifeExecutor>(&self, column: &str, executor: &X) -> Result<Option<T>, LifeError> {
        self.aggregate("MIN", column, executor)
    }

    pub fn max<T: TryGetable, X: LifeExecutor>(&self, column: &str, executor: &X) -> Result<Option<T>, LifeError> {
        self.aggregate("MAX", column, executor)
    }

    pub fn average<T: TryGetable, X: LifeExecutor>(&self, column: &str, executor: &X) -> Result<Option<T>, LifeError> {
        self.aggregate("AVG", column, executor)
    }

    fn aggregate<T: TryGetable, X: LifeExecutor>(
        &self,
        function: &str,
        column: &str,
        executor: &X,
    ) -> Result<Option<T>, LifeError> {
        let expr = format!("{function}({column})");
        let value = self.query_scalar(&expr, Value::Double(None), executor)?;
        if is_null_value(&value) {
            return Ok(None);
        }
        T::try_get(value)
            .map(Some)
            .map_err(|e| LifeError::ParseError(format!("{expr}: {e}")))
    }
}
