//! Span helpers used when the `tracing` feature is enabled.

use tracing::Span;

/// Span covering a single statement round trip.
pub fn execute_query_span(sql: &str) -> Span {
    tracing::debug_span!("lifeguard.execute_query", db.statement = %sql)
}

/// Span covering the batched fetch of one eager relation.
pub fn eager_load_span(relation: &str, parents: usize) -> Span {
    tracing::debug_span!("lifeguard.eager_load", relation = %relation, parents = parents)
}
