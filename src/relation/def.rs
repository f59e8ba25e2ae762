//! Relation definitions.
//!
//! A [`RelationDef`] is what an entity hands back for a relation name: the
//! related table's query, the link columns, and an optional junction table.
//! It is built from a relational [`ActiveQuery`](crate::ActiveQuery) via
//! `into_relation`.

use crate::executor::LifeError;
use crate::query::base::Query;
use crate::query::condition::Filter;
use std::fmt;

/// Type of relationship between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relationship
    HasOne,
    /// One-to-many relationship
    HasMany,
}

/// Column pairs linking a related table to its primary table.
///
/// Each pair is `(related column, primary column)`. For a customer's orders,
/// `[("customer_id", "id")]` reads as `order.customer_id = customer.id`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Link(Vec<(String, String)>);

impl Link {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Link(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Columns on the related side.
    pub fn related_columns(&self) -> Vec<&str> {
        self.0.iter().map(|(related, _)| related.as_str()).collect()
    }

    /// Columns on the primary side.
    pub fn primary_columns(&self) -> Vec<&str> {
        self.0.iter().map(|(_, primary)| primary.as_str()).collect()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Link {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Link::new(pairs)
    }
}

impl From<Vec<(String, String)>> for Link {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Link(pairs)
    }
}

/// Junction table between a primary and a related table.
///
/// `query` selects from the junction table; `link` pairs are
/// `(junction column, primary column)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Via {
    pub query: Query,
    pub link: Link,
}

impl Via {
    pub fn table(&self) -> Result<&str, LifeError> {
        self.query
            .from
            .first()
            .map(|source| source.table.as_str())
            .ok_or_else(|| LifeError::ConfigurationError("Junction query has no table".to_string()))
    }

    pub fn reference_name(&self) -> Result<&str, LifeError> {
        self.query
            .from
            .first()
            .map(|source| source.reference_name())
            .ok_or_else(|| LifeError::ConfigurationError("Junction query has no table".to_string()))
    }
}

pub(crate) type RelationLookup = fn(&str) -> Result<RelationDef, LifeError>;

/// A resolved relation of some entity.
#[derive(Clone)]
pub struct RelationDef {
    pub name: String,
    pub rel_type: RelationType,
    /// Query over the related table, carrying the relation's own filter and params.
    pub query: Query,
    /// Extra join condition, applied in `ON` when joining and in `WHERE` when loading.
    pub on: Option<Filter>,
    pub link: Link,
    pub via: Option<Via>,
    /// Primary key of the related table.
    pub primary_key: Vec<String>,
    pub(crate) lookup: RelationLookup,
}

impl RelationDef {
    /// The related table.
    pub fn table(&self) -> &str {
        self.query.from.first().map(|s| s.table.as_str()).unwrap_or_default()
    }

    /// Alias set on the relation query, if any.
    pub fn alias(&self) -> Option<&str> {
        self.query.from.first().and_then(|s| s.alias.as_deref())
    }

    pub fn is_multiple(&self) -> bool {
        self.rel_type == RelationType::HasMany
    }

    /// Resolve a relation of the related entity, for nested paths like `orders.items`.
    pub fn relation(&self, name: &str) -> Result<RelationDef, LifeError> {
        (self.lookup)(name)
    }
}

impl fmt::Debug for RelationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationDef")
            .field("name", &self.name)
            .field("rel_type", &self.rel_type)
            .field("query", &self.query)
            .field("on", &self.on)
            .field("link", &self.link)
            .field("via", &self.via)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}
