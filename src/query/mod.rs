//! Query building and execution for entities.
//!
//! # Architecture
//!
//! - **Condition**: filter trees and bound parameters (`Filter`, `Params`)
//! - **Base**: plain SELECT parts as data (`Query`)
//! - **Active**: entity-bound query with relations (`ActiveQuery`)
//! - **Execution**: commands, `prepare`, `all`/`one`, scalar helpers
//! - **Traits**: entity and model traits (`LifeModelTrait`, `FromRow`)
//! - **Value Conversion**: SeaQuery `Value` to `ToSql` parameters

pub mod traits;
#[doc(inline)]
pub use traits::{
    populate_models, unknown_relation, FromRow, LifeEntityName, LifeModelTrait, ModelTrait,
};

pub mod condition;
#[doc(inline)]
pub use condition::{combine, params, Filter, Logic, Params};

pub mod base;
#[doc(inline)]
pub use base::{JoinClause, JoinKind, Query, SortOrder, TableSource};

pub mod active;
#[doc(inline)]
pub use active::{ActiveQuery, JoinWith};

pub mod execution;
#[doc(inline)]
pub use execution::{Command, PreparedQuery};

pub(crate) mod iden;

pub(crate) mod value_conversion;
