//! # Lifeguard ActiveQuery
//!
//! Active Record style queries for Lifeguard entities: filter and `on`
//! condition composition, relational joins (`join_with`, junction tables),
//! table aliases, row population and batched eager loading.
//!
//! ```
//! use lifeguard_activequery::{Filter, JoinKind, LifeModelTrait, Params};
//! # use lifeguard_activequery::{FromRow, LifeEntityName, LifeError, ModelTrait, Row};
//! # #[derive(Default)] struct Customer;
//! # struct CustomerModel;
//! # impl FromRow for CustomerModel { fn from_row(_: &Row) -> Result<Self, LifeError> { Ok(Self) } }
//! # impl ModelTrait for CustomerModel {}
//! # impl LifeEntityName for Customer { fn table_name(&self) -> &'static str { "customer" } }
//! # impl LifeModelTrait for Customer { type Model = CustomerModel; }
//!
//! let query = Customer::find()
//!     .and_filter(Filter::eq("status", 1), Params::new())
//!     .join_with(["profile"]);
//! assert_eq!(query.join_with[0].join_type, JoinKind::Left);
//! ```

pub mod config;
pub mod executor;
pub mod query;
pub mod relation;
pub mod row;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod value;

#[cfg(feature = "tracing")]
pub mod tracing_helpers;

pub use config::{Dialect, QueryConfig};
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};
pub use query::{
    combine, params, ActiveQuery, Command, Filter, FromRow, JoinClause, JoinKind, JoinWith,
    LifeEntityName, LifeModelTrait, Logic, ModelTrait, Params, PreparedQuery, Query, SortOrder,
    TableSource, populate_models, unknown_relation,
};
pub use relation::{Link, RelationDef, RelationType, Via};
pub use row::Row;
pub use value::{TryGetable, ValueExtractionError};
