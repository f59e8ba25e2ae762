//! Plain select query.
//!
//! [`Query`] holds the SELECT parts (sources, filter, joins, ordering,
//! paging) as data so relation joins and aliases can be rewritten before the
//! statement is built. [`Query::to_statement`] lowers it to a SeaQuery
//! `SelectStatement`.

use crate::executor::LifeError;
use crate::query::condition::{combine, merge_params, Filter, Logic, Params};
use crate::query::iden::{is_column_name, name};
use sea_query::{Asterisk, Condition, Expr, JoinType, Order, QueryBuilder, SelectStatement, Values};
use std::fmt;

/// A table in `FROM` or `JOIN`, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    pub table: String,
    pub alias: Option<String>,
}

impl TableSource {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), alias: None }
    }

    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self { table: table.into(), alias: Some(alias.into()) }
    }

    /// Name used to qualify columns: the alias if set, else the table.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// `"customer"` or `"customer c"`.
impl From<&str> for TableSource {
    fn from(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        let table = parts.next().unwrap_or_default();
        match parts.last() {
            Some(alias) => Self::aliased(table, alias),
            None => Self::new(table),
        }
    }
}

impl From<String> for TableSource {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Join type for [`Query::join`] and `join_with`. Relation joins default to `LEFT JOIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Left,
    Inner,
    Right,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Left => write!(f, "LEFT JOIN"),
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Right => write!(f, "RIGHT JOIN"),
        }
    }
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Left => JoinType::LeftJoin,
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Right => JoinType::RightJoin,
        }
    }
}

/// One `JOIN` of a [`Query`]; `on: None` joins on an empty (true) condition.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: TableSource,
    pub on: Option<Filter>,
}

/// Direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Selected columns or expressions; empty means `*`.
    pub select: Vec<String>,
    pub distinct: bool,
    pub from: Vec<TableSource>,
    pub filter: Option<Filter>,
    pub params: Params,
    pub joins: Vec<JoinClause>,
    pub group_by: Vec<String>,
    pub order_by: Vec<(String, SortOrder)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selected columns. Names may be qualified (`customer.id`)
    /// or raw expressions such as `COUNT(*)`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Emit `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Replace the `FROM` sources with a single table.
    pub fn from(mut self, source: impl Into<TableSource>) -> Self {
        self.from = vec![source.into()];
        self
    }

    /// Replace the filter and merge `params` into the bound parameters.
    pub fn set_filter(mut self, filter: Filter, params: Params) -> Self {
        self.filter = Some(filter);
        merge_params(&mut self.params, params);
        self
    }

    /// AND `filter` onto the current one, or set it when there is none.
    pub fn and_filter(mut self, filter: Filter, params: Params) -> Self {
        self.filter = Some(combine(self.filter.take(), filter, Logic::And));
        merge_params(&mut self.params, params);
        self
    }

    /// OR `filter` onto the current one, or set it when there is none.
    pub fn or_filter(mut self, filter: Filter, params: Params) -> Self {
        self.filter = Some(combine(self.filter.take(), filter, Logic::Or));
        merge_params(&mut self.params, params);
        self
    }

    /// AND a filter without parameters.
    pub fn filter(self, filter: Filter) -> Self {
        self.and_filter(filter, Params::new())
    }

    /// Merge named parameters for raw filters; later values win.
    pub fn add_params(mut self, params: Params) -> Self {
        merge_params(&mut self.params, params);
        self
    }

    /// Append a join on `table` (`"order"` or `"order o"`).
    pub fn join(mut self, kind: JoinKind, table: impl Into<TableSource>, on: Filter) -> Self {
        self.joins.push(JoinClause { kind, table: table.into(), on: Some(on) });
        self
    }

    /// Append an `ORDER BY` term.
    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Replace the `GROUP BY` columns.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set `LIMIT`.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set `OFFSET`.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Lower to a SeaQuery statement.
    ///
    /// # Errors
    ///
    /// `LifeError::QueryError` if there is no `FROM` source or a raw filter
    /// references an unbound parameter.
    pub fn to_statement(&self) -> Result<SelectStatement, LifeError> {
        if self.from.is_empty() {
            return Err(LifeError::QueryError("Query has no FROM source".to_string()));
        }

        let mut stmt = SelectStatement::default();
        if self.distinct {
            stmt.distinct();
        }

        if self.select.is_empty() {
            stmt.column(Asterisk);
        } else {
            for column in &self.select {
                select_column(&mut stmt, column);
            }
        }

        for source in &self.from {
            match &source.alias {
                Some(alias) => stmt.from_as(name(&source.table), name(alias)),
                None => stmt.from(name(&source.table)),
            };
        }

        for join in &self.joins {
            let on = match &join.on {
                Some(filter) => filter.to_condition(&self.params)?,
                None => Condition::all(),
            };
            match &join.table.alias {
                Some(alias) => stmt.join_as(join.kind.into(), name(&join.table.table), name(alias), on),
                None => stmt.join(join.kind.into(), name(&join.table.table), on),
            };
        }

        if let Some(filter) = &self.filter {
            stmt.cond_where(filter.to_condition(&self.params)?);
        }

        for column in &self.group_by {
            match column.split_once('.') {
                Some((table, col)) => stmt.group_by_col((name(table), name(col))),
                None => stmt.group_by_col(name(column)),
            };
        }

        for (column, order) in &self.order_by {
            match column.split_once('.') {
                Some((table, col)) => stmt.order_by((name(table), name(col)), (*order).into()),
                None => stmt.order_by(name(column), (*order).into()),
            };
        }

        if let Some(limit) = self.limit {
            stmt.limit(limit);
        }
        if let Some(offset) = self.offset {
            stmt.offset(offset);
        }

        Ok(stmt)
    }

    /// Build SQL and values with the given backend.
    pub fn build<B: QueryBuilder>(&self, builder: B) -> Result<(String, Values), LifeError> {
        Ok(self.to_statement()?.build(builder))
    }
}

fn select_column(stmt: &mut SelectStatement, column: &str) {
    if column == "*" {
        stmt.column(Asterisk);
    } else if let Some(table) = column.strip_suffix(".*").filter(|t| is_column_name(t)) {
        stmt.column((name(table), Asterisk));
    } else if is_column_name(column) {
        match column.split_once('.') {
            Some((table, col)) => stmt.column((name(table), name(col))),
            None => stmt.column(name(column)),
        };
    } else {
        stmt.expr(Expr::cust(column.to_string()));
    }
}
