//! `ActiveQuery`: entity-bound query with relations.
//!
//! An `ActiveQuery<E>` wraps a plain [`Query`] with the pieces that only make
//! sense for an entity:
//!
//! - an `on` condition, joined into `ON` when the query is used as a relation
//!   and appended to `WHERE` otherwise
//! - `join_with` specs resolved into relational joins at prepare time
//! - eager relations (`with`) loaded after population
//! - relation context (`link`, `multiple`, `via`) when built by
//!   `has_one`/`has_many`
//!
//! Query building lives here; execution is in the `execution` module.

use crate::config::QueryConfig;
use crate::executor::LifeError;
use crate::query::base::{JoinKind, Query, SortOrder, TableSource};
use crate::query::condition::{combine, merge_params, Filter, Logic, Params};
use crate::query::traits::{LifeEntityName, LifeModelTrait};
use crate::relation::def::{Link, RelationDef, RelationType, Via};
use crate::relation::join::JoinBuilder;
use crate::row::Row;
use crate::value::is_null_value;
use std::fmt;
use std::marker::PhantomData;

/// A `join_with` request: relation names joined with one join type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinWith {
    pub names: Vec<String>,
    pub eager: bool,
    pub join_type: JoinKind,
}

/// Entity query with relational joins and eager loading.
///
/// # Example
///
/// ```no_run
/// use lifeguard_activequery::{Filter, LifeModelTrait, MayPostgresExecutor, Params};
/// # use lifeguard_activequery::{FromRow, LifeEntityName, LifeError, ModelTrait, Row};
/// # #[derive(Default)] struct Customer;
/// # struct CustomerModel;
/// # impl FromRow for CustomerModel { fn from_row(_: &Row) -> Result<Self, LifeError> { Ok(Self) } }
/// # impl ModelTrait for CustomerModel {}
/// # impl LifeEntityName for Customer { fn table_name(&self) -> &'static str { "customer" } }
/// # impl LifeModelTrait for Customer { type Model = CustomerModel; }
/// # fn run(executor: &MayPostgresExecutor) -> Result<(), LifeError> {
///
/// let customers = Customer::find()
///     .inner_join_with(["orders"])
///     .and_filter(Filter::eq("customer.status", 1), Params::new())
///     .all(executor)?;
/// # Ok(())
/// # }
/// ```
pub struct ActiveQuery<E>
where
    E: LifeModelTrait,
{
    pub query: Query,
    pub on: Option<Filter>,
    pub join_with: Vec<JoinWith>,
    /// Relations loaded with a separate query after population.
    pub with: Vec<String>,
    /// Set when this query is a relation of another entity.
    pub link: Link,
    pub multiple: bool,
    pub via: Option<Via>,
    /// Primary row for lazy loading; its link values filter this query.
    pub primary: Option<Row>,
    pub config: QueryConfig,
    _entity: PhantomData<E>,
}

impl<E> ActiveQuery<E>
where
    E: LifeModelTrait,
{
    /// Create a query using the global configuration.
    pub fn new() -> Self {
        Self::with_config(QueryConfig::global().clone())
    }

    /// Create a query with an explicit configuration.
    ///
    /// The entity's `on_query_init` hook runs before this returns.
    pub fn with_config(config: QueryConfig) -> Self {
        let mut query = Self {
            query: Query::new(),
            on: None,
            join_with: Vec::new(),
            with: Vec::new(),
            link: Link::default(),
            multiple: false,
            via: None,
            primary: None,
            config,
            _entity: PhantomData,
        };
        E::on_query_init(&mut query);
        query
    }

    /// Create a query and run `init` on it after the entity hook.
    pub fn with_init<F>(init: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut query = Self::new();
        init(&mut query);
        query
    }

    /// Relation query for a single related row.
    pub fn has_one(link: impl Into<Link>) -> Self {
        let mut query = Self::new();
        query.link = link.into();
        query.multiple = false;
        query
    }

    /// Relation query for many related rows.
    pub fn has_many(link: impl Into<Link>) -> Self {
        let mut query = Self::new();
        query.link = link.into();
        query.multiple = true;
        query
    }

    pub fn set_filter(mut self, filter: Filter, params: Params) -> Self {
        self.query = self.query.set_filter(filter, params);
        self
    }

    pub fn and_filter(mut self, filter: Filter, params: Params) -> Self {
        self.query = self.query.and_filter(filter, params);
        self
    }

    pub fn or_filter(mut self, filter: Filter, params: Params) -> Self {
        self.query = self.query.or_filter(filter, params);
        self
    }

    pub fn filter(self, filter: Filter) -> Self {
        self.and_filter(filter, Params::new())
    }

    pub fn add_params(mut self, params: Params) -> Self {
        merge_params(&mut self.query.params, params);
        self
    }

    /// Replace the `on` condition.
    pub fn on_condition(mut self, filter: Filter, params: Params) -> Self {
        self.on = Some(filter);
        merge_params(&mut self.query.params, params);
        self
    }

    pub fn and_on_condition(mut self, filter: Filter, params: Params) -> Self {
        self.on = Some(combine(self.on.take(), filter, Logic::And));
        merge_params(&mut self.query.params, params);
        self
    }

    pub fn or_on_condition(mut self, filter: Filter, params: Params) -> Self {
        self.on = Some(combine(self.on.take(), filter, Logic::Or));
        merge_params(&mut self.query.params, params);
        self
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query = self.query.select(columns);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.query = self.query.distinct();
        self
    }

    pub fn from(mut self, source: impl Into<TableSource>) -> Self {
        self.query = self.query.from(source);
        self
    }

    pub fn join(mut self, kind: JoinKind, table: impl Into<TableSource>, on: Filter) -> Self {
        self.query = self.query.join(kind, table, on);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.query = self.query.order_by(column, order);
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query = self.query.group_by(columns);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query = self.query.offset(offset);
        self
    }

    /// Join the named relations with `LEFT JOIN` and load them eagerly.
    ///
    /// Names may be nested (`"orders.items"`) and may carry an alias for the
    /// last segment (`"orders o"`).
    pub fn join_with<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join_with_options(names, true, JoinKind::Left)
    }

    pub fn join_with_options<I, S>(mut self, names: I, eager: bool, join_type: JoinKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join_with.push(JoinWith {
            names: names.into_iter().map(Into::into).collect(),
            eager,
            join_type,
        });
        self
    }

    pub fn inner_join_with<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join_with_options(names, true, JoinKind::Inner)
    }

    /// Load the named relations with separate queries after population.
    pub fn with<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with.extend(names.into_iter().map(Into::into));
        self
    }

    /// Route this relation through a junction table.
    ///
    /// `link` pairs are `(junction column, primary column)`.
    ///
    /// # Errors
    ///
    /// `LifeError::ConfigurationError` if this is not a relation query.
    pub fn via_table(self, table: impl Into<TableSource>, link: impl Into<Link>) -> Result<Self, LifeError> {
        self.via_table_with(table, link, |query| query)
    }

    /// Like [`via_table`](Self::via_table), letting `f` adjust the junction query.
    pub fn via_table_with<F>(
        mut self,
        table: impl Into<TableSource>,
        link: impl Into<Link>,
        f: F,
    ) -> Result<Self, LifeError>
    where
        F: FnOnce(Query) -> Query,
    {
        if self.link.is_empty() {
            return Err(LifeError::ConfigurationError(format!(
                "via_table() on {} requires a relation query built by has_one() or has_many()",
                std::any::type_name::<E>()
            )));
        }
        let junction = f(Query::new().from(table));
        self.via = Some(Via { query: junction, link: link.into() });
        Ok(self)
    }

    /// Alias the entity's table.
    ///
    /// With at most one `FROM` source the source becomes `table AS alias`,
    /// where `table` is the existing source's table or the entity's table.
    /// With several sources, each source over the entity's table is aliased.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if self.query.from.len() < 2 {
            let (table, _) = self.table_name_and_alias();
            self.query.from = vec![TableSource::aliased(table, alias)];
        } else {
            let table = E::default().table_name();
            for source in self.query.from.iter_mut().filter(|s| s.table == table) {
                source.alias = Some(alias.clone());
            }
        }
        self
    }

    /// Attach a primary row; the query then only matches rows linked to it.
    pub fn primary(mut self, row: Row) -> Self {
        self.primary = Some(row);
        self
    }

    /// `(table, alias)` of the main source; the alias falls back to the table.
    pub fn table_name_and_alias(&self) -> (String, String) {
        match self.query.from.first() {
            Some(source) => (source.table.clone(), source.reference_name().to_string()),
            None => {
                let table = E::default().table_name().to_string();
                (table.clone(), table)
            }
        }
    }

    /// Erase this relation query into a [`RelationDef`] named `name`.
    pub fn into_relation(self, name: impl Into<String>) -> RelationDef {
        let entity = E::default();
        let mut query = self.query;
        if query.from.is_empty() {
            query.from.push(TableSource::new(entity.table_name()));
        }
        RelationDef {
            name: name.into(),
            rel_type: if self.multiple { RelationType::HasMany } else { RelationType::HasOne },
            query,
            on: self.on,
            link: self.link,
            via: self.via,
            primary_key: entity.primary_key().iter().map(|c| (*c).to_string()).collect(),
            lookup: lookup::<E>,
        }
    }

    /// Resolve joins, defaults and relation filters into the final [`Query`].
    pub(crate) fn build_query(&self) -> Result<Query, LifeError> {
        let mut query = self.query.clone();
        if query.from.is_empty() {
            query.from.push(TableSource::new(E::default().table_name()));
        }

        if !self.join_with.is_empty() {
            let (_, alias) = self.table_name_and_alias();
            let mut builder = JoinBuilder::new(&mut query, alias, lookup::<E>);
            for spec in &self.join_with {
                for name in &spec.names {
                    builder.join(name, spec.join_type)?;
                }
            }
        }

        if query.select.is_empty() && !query.joins.is_empty() {
            let (_, alias) = self.table_name_and_alias();
            query.select.push(format!("{alias}.*"));
        }

        if let Some(primary) = &self.primary {
            let filter = self.primary_filter(primary, !query.joins.is_empty())?;
            query.filter = Some(combine(query.filter.take(), filter, Logic::And));
        }

        if let Some(on) = &self.on {
            query.filter = Some(combine(query.filter.take(), on.clone(), Logic::And));
        }

        Ok(query)
    }

    /// Filter matching rows linked to `primary`.
    fn primary_filter(&self, primary: &Row, qualify: bool) -> Result<Filter, LifeError> {
        if self.link.is_empty() {
            return Err(LifeError::ConfigurationError(format!(
                "Lazy loading {} needs a relation link",
                std::any::type_name::<E>()
            )));
        }
        let (_, alias) = self.table_name_and_alias();
        let column = |c: &str| if qualify { format!("{alias}.{c}") } else { c.to_string() };
        let value_of = |row: &Row, c: &str| {
            row.get(c).cloned().ok_or_else(|| {
                LifeError::ConfigurationError(format!("Primary row has no `{c}` column"))
            })
        };

        match &self.via {
            None => {
                let mut pairs = Vec::with_capacity(self.link.pairs().len());
                for (related, primary_col) in self.link.pairs() {
                    pairs.push((column(related), value_of(primary, primary_col)?));
                }
                // A NULL link has no related rows, not the rows whose column IS NULL
                if pairs.iter().any(|(_, value)| is_null_value(value)) {
                    return Ok(Filter::none());
                }
                Ok(Filter::columns(pairs))
            }
            Some(via) => {
                let [(related, junction_col)] = self.link.pairs() else {
                    return Err(LifeError::ConfigurationError(
                        "Lazy loading through a junction table supports a single link column".to_string(),
                    ));
                };
                let mut junction_filter = Vec::with_capacity(via.link.pairs().len());
                for (junction, primary_col) in via.link.pairs() {
                    junction_filter.push((junction.clone(), value_of(primary, primary_col)?));
                }
                if junction_filter.iter().any(|(_, value)| is_null_value(value)) {
                    return Ok(Filter::none());
                }
                let junction = via
                    .query
                    .clone()
                    .select([junction_col.clone()])
                    .filter(Filter::columns(junction_filter));
                Ok(Filter::InQuery { column: column(related), query: Box::new(junction) })
            }
        }
    }

    /// Relation paths to load after population: `with` plus eager
    /// `join_with`, aliases stripped, duplicates dropped, in request order.
    pub(crate) fn eager_relations(&self) -> Vec<String> {
        let joined = self
            .join_with
            .iter()
            .filter(|spec| spec.eager)
            .flat_map(|spec| spec.names.iter());
        let mut paths: Vec<String> = Vec::new();
        for name in self.with.iter().chain(joined) {
            let path = name.split_whitespace().next().unwrap_or_default();
            if !path.is_empty() && !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
        paths
    }
}

pub(crate) fn lookup<E: LifeModelTrait>(name: &str) -> Result<RelationDef, LifeError> {
    E::default().relation(name)
}

impl<E: LifeModelTrait> Default for ActiveQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: LifeModelTrait> Clone for ActiveQuery<E> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            on: self.on.clone(),
            join_with: self.join_with.clone(),
            with: self.with.clone(),
            link: self.link.clone(),
            multiple: self.multiple,
            via: self.via.clone(),
            primary: self.primary.clone(),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: LifeModelTrait> fmt::Debug for ActiveQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveQuery")
            .field("entity", &std::any::type_name::<E>())
            .field("query", &self.query)
            .field("on", &self.on)
            .field("join_with", &self.join_with)
            .field("with", &self.with)
            .field("link", &self.link)
            .field("multiple", &self.multiple)
            .field("via", &self.via)
            .finish_non_exhaustive()
    }
}
