//! Filter expressions and bound parameters.
//!
//! A [`Filter`] is the boolean tree behind both the `WHERE` part of a query
//! and the `ON` part of a relational join. Trees are only ever grown through
//! [`combine`]: an empty slot takes the new filter as-is, a filled slot is
//! wrapped as `Combine(op, old, new)`.

use crate::executor::LifeError;
use crate::query::iden::col_expr;
use crate::value::is_null_value;
use sea_query::{Condition, Expr, ExprTrait, Value};
use std::collections::BTreeMap;

/// Named parameters bound into [`Filter::Raw`] fragments.
///
/// Keys are unique; merging overwrites. A key may be written with or without
/// its leading colon.
pub type Params = BTreeMap<String, Value>;

/// Build a [`Params`] map from `(name, value)` pairs.
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Merge `params` into `target`, later values winning.
pub fn merge_params(target: &mut Params, params: Params) {
    target.extend(params);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value` for every entry, joined with AND. A null value
    /// renders as `IS NULL`.
    Columns(BTreeMap<String, Value>),
    /// `column IN (values...)`
    In { column: String, values: Vec<Value> },
    /// `left = right` between two columns, as used by join links.
    ColumnEq(String, String),
    /// `column IN (SELECT ...)`
    InQuery {
        column: String,
        query: Box<crate::query::base::Query>,
    },
    /// Verbatim SQL; `:name` placeholders are bound from the query params.
    Raw(String),
    Combine {
        op: Logic,
        left: Box<Filter>,
        right: Box<Filter>,
    },
}

impl Filter {
    pub fn columns<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Filter::Columns(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::columns([(column.into(), value.into())])
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Filter::Raw(sql.into())
    }

    /// Condition no row satisfies.
    pub fn none() -> Self {
        Filter::Raw("1 = 0".to_string())
    }

    pub fn and(self, other: Filter) -> Self {
        combine(Some(self), other, Logic::And)
    }

    pub fn or(self, other: Filter) -> Self {
        combine(Some(self), other, Logic::Or)
    }

    /// Lower the tree to a SeaQuery condition, binding raw placeholders from `params`.
    pub(crate) fn to_condition(&self, params: &Params) -> Result<Condition, LifeError> {
        let condition = match self {
            Filter::Columns(columns) => {
                let mut cond = Condition::all();
                for (column, value) in columns {
                    cond = if is_null_value(value) {
                        cond.add(col_expr(column).is_null())
                    } else {
                        cond.add(col_expr(column).eq(value.clone()))
                    };
                }
                cond
            }
            Filter::In { column, values } => {
                Condition::all().add(col_expr(column).is_in(values.iter().cloned()))
            }
            Filter::ColumnEq(left, right) => Condition::all().add(col_expr(left).eq(col_expr(right))),
            Filter::InQuery { column, query } => {
                Condition::all().add(col_expr(column).in_subquery(query.to_statement()?))
            }
            Filter::Raw(sql) => {
                let (sql, values) = bind_named(sql, params)?;
                if values.is_empty() {
                    Condition::all().add(Expr::cust(sql))
                } else {
                    Condition::all().add(Expr::cust_with_values(sql, values))
                }
            }
            Filter::Combine { op, left, right } => {
                let cond = match op {
                    Logic::And => Condition::all(),
                    Logic::Or => Condition::any(),
                };
                cond.add(left.to_condition(params)?)
                    .add(right.to_condition(params)?)
            }
        };
        Ok(condition)
    }
}

/// Combine `filter` into an optional existing tree.
///
/// Without an existing tree the result is `filter` itself; otherwise the old
/// tree becomes the left operand.
pub fn combine(existing: Option<Filter>, filter: Filter, op: Logic) -> Filter {
    match existing {
        None => filter,
        Some(old) => Filter::Combine {
            op,
            left: Box::new(old),
            right: Box::new(filter),
        },
    }
}

/// Replace `:name` placeholders with positional `?` markers and collect the values.
///
/// `::` casts and quoted literals are left alone.
fn bind_named(sql: &str, params: &Params) -> Result<(String, Vec<Value>), LifeError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut in_quote = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            in_quote = !in_quote;
            out.push(c);
            i += 1;
            continue;
        }
        if c == ':' && !in_quote {
            if chars.get(i + 1) == Some(&':') {
                out.push_str("::");
                i += 2;
                continue;
            }
            let starts_ident = chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_');
            if starts_ident {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let param: String = chars[start..end].iter().collect();
                let value = params
                    .get(&param)
                    .or_else(|| params.get(&format!(":{param}")))
                    .ok_or_else(|| {
                        LifeError::QueryError(format!("Missing value for bound parameter `:{param}`"))
                    })?;
                values.push(value.clone());
                out.push('?');
                i = end;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }

    Ok((out, values))
}
