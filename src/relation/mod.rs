//! Entity relations.
//!
//! - **Def**: relation definitions (`RelationDef`, `Link`, `Via`)
//! - **Join**: resolving `join_with` paths into joins
//! - **Eager**: batched loading of related rows after population

pub mod def;
#[doc(inline)]
pub use def::{Link, RelationDef, RelationType, Via};

pub(crate) mod join;

pub(crate) mod eager;
