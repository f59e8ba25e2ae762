//! Entity and model traits.
//!
//! An entity is a zero-sized `Default` type naming a table; its `Model` is the
//! row struct built from query results. Following SeaORM's split, queries are
//! parameterized by the entity and yield `E::Model`.

use crate::executor::LifeError;
use crate::query::active::ActiveQuery;
use crate::relation::def::RelationDef;
use crate::row::Row;

/// Trait for entity name
pub trait LifeEntityName {
    /// Get the table name
    fn table_name(&self) -> &'static str;
}

/// Trait for entities that can be queried
///
/// # Example
///
/// ```
/// use lifeguard_activequery::{FromRow, LifeEntityName, LifeError, LifeModelTrait, ModelTrait, Row};
///
/// #[derive(Default)]
/// struct Customer;
///
/// struct CustomerModel {
///     id: i32,
/// }
///
/// impl FromRow for CustomerModel {
///     fn from_row(row: &Row) -> Result<Self, LifeError> {
///         Ok(Self { id: row.try_get("id")? })
///     }
/// }
///
/// impl ModelTrait for CustomerModel {}
///
/// impl LifeEntityName for Customer {
///     fn table_name(&self) -> &'static str {
///         "customer"
///     }
/// }
///
/// impl LifeModelTrait for Customer {
///     type Model = CustomerModel;
/// }
///
/// let query = Customer::find();
/// assert!(query.query.from.is_empty());
/// ```
pub trait LifeModelTrait: LifeEntityName + Default + Sized + 'static {
    /// The model type returned by queries
    type Model: FromRow + ModelTrait;

    /// Primary key columns, used to deduplicate joined rows.
    fn primary_key(&self) -> &'static [&'static str] {
        &["id"]
    }

    /// Resolve a relation by name.
    ///
    /// Implementations usually build it from `ActiveQuery::has_one` /
    /// `has_many` and finish with `into_relation(name)`.
    ///
    /// # Errors
    ///
    /// `LifeError::ConfigurationError` for an unknown relation.
    fn relation(&self, name: &str) -> Result<RelationDef, LifeError> {
        Err(unknown_relation::<Self>(name))
    }

    /// Hook run at the end of every `ActiveQuery` construction.
    fn on_query_init(_query: &mut ActiveQuery<Self>) {}

    /// Start a query over this entity.
    fn find() -> ActiveQuery<Self> {
        ActiveQuery::new()
    }
}

/// Build a model from a decoded row.
pub trait FromRow: Sized {
    /// # Errors
    ///
    /// `LifeError::ParseError` when a column is missing or has the wrong type.
    fn from_row(row: &Row) -> Result<Self, LifeError>;
}

/// Per-model hooks used by eager loading.
pub trait ModelTrait {
    /// Store rows loaded for relation `name` on this model.
    ///
    /// # Errors
    ///
    /// The default rejects every relation with `LifeError::ConfigurationError`.
    fn populate_relation(&mut self, name: &str, rows: Vec<Row>) -> Result<(), LifeError> {
        let _ = rows;
        Err(LifeError::ConfigurationError(format!(
            "{} cannot hold relation `{name}`",
            std::any::type_name::<Self>()
        )))
    }
}

/// Build models from rows and hand each one the nested relation rows its
/// row carries, for use inside [`ModelTrait::populate_relation`].
///
/// # Errors
///
/// Propagates `from_row` and `populate_relation` failures.
pub fn populate_models<M: FromRow + ModelTrait>(rows: &[Row]) -> Result<Vec<M>, LifeError> {
    rows.iter()
        .map(|row| {
            let mut model = M::from_row(row)?;
            for (name, related) in row.relations() {
                model.populate_relation(name, related.to_vec())?;
            }
            Ok(model)
        })
        .collect()
}

/// Error for a relation name the entity does not define.
pub fn unknown_relation<E>(name: &str) -> LifeError {
    LifeError::ConfigurationError(format!(
        "{} has no relation named `{name}`",
        std::any::type_name::<E>()
    ))
}
