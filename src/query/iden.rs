//! Runtime identifiers for SeaQuery.
//!
//! Table and column names here are only known at runtime (aliases, relation
//! tables), so they are wrapped in an owned `Iden` instead of static enums.

use sea_query::{Expr, Iden};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Name(String);

impl Iden for Name {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

pub(crate) fn name(s: &str) -> Name {
    Name(s.to_string())
}

/// Column expression for `column` or `table.column`.
pub(crate) fn col_expr(column: &str) -> Expr {
    match column.split_once('.') {
        Some((table, col)) => Expr::col((name(table), name(col))),
        None => Expr::col(name(column)),
    }
}

/// Whether `s` is a plain (optionally table-qualified) column name.
pub(crate) fn is_column_name(s: &str) -> bool {
    fn ident(part: &str) -> bool {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
    match s.split_once('.') {
        Some((table, col)) => ident(table) && ident(col),
        None => ident(s),
    }
}
