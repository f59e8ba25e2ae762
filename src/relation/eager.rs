//! Eager loading for `with` and eager `join_with` relations.
//!
//! Uses the selectin strategy: one `IN` query per relation and batch of
//! parent keys, instead of one query per parent. Relations through a junction
//! table first load the junction rows, then the related rows.
//!
//! Related rows are matched back to parents by link column values and handed
//! to [`ModelTrait::populate_relation`] in parent order. Nested paths
//! (`orders.items`) are loaded level by level: rows of a deeper relation are
//! attached to the related rows with [`Row::set_related`].

use crate::config::QueryConfig;
use crate::executor::{LifeError, LifeExecutor};
use crate::query::base::Query;
use crate::query::condition::{combine, Filter, Logic};
use crate::query::execution::Command;
use crate::query::traits::ModelTrait;
use crate::relation::def::{RelationDef, RelationLookup};
use crate::row::Row;
use sea_query::Value;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Load every relation path in `paths` for `parents` and store it on `models`.
///
/// `parents[i]` is the row `models[i]` was built from.
pub(crate) fn load_eager<M, X>(
    root: RelationLookup,
    paths: &[String],
    parents: &[Row],
    models: &mut [M],
    executor: &X,
    config: &QueryConfig,
) -> Result<(), LifeError>
where
    M: ModelTrait,
    X: LifeExecutor,
{
    for (name, nested) in path_tree(paths)? {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::eager_load_span(&name, parents.len()).entered();

        let def = root(&name)?;
        let mut related = fetch_related(&def, parents, executor, config)?;
        if !nested.is_empty() {
            attach_grouped(&def, &nested, &mut related, executor, config)?;
        }
        log::debug!(
            "Eager loaded relation `{}` for {} parent rows",
            name,
            parents.len()
        );
        for (model, rows) in models.iter_mut().zip(related) {
            model.populate_relation(&name, rows)?;
        }
    }
    Ok(())
}

/// Split paths into their first segment and the remaining sub-paths,
/// keeping first-seen order.
fn path_tree(paths: &[String]) -> Result<Vec<(String, Vec<String>)>, LifeError> {
    let mut tree: Vec<(String, Vec<String>)> = Vec::new();
    for path in paths {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path.as_str(), None),
        };
        if head.is_empty() || rest.is_some_and(str::is_empty) {
            return Err(LifeError::ConfigurationError(format!(
                "Malformed relation path `{path}`"
            )));
        }
        let index = match tree.iter().position(|(name, _)| name == head) {
            Some(index) => index,
            None => {
                tree.push((head.to_string(), Vec::new()));
                tree.len() - 1
            }
        };
        if let Some(rest) = rest {
            let nested = &mut tree[index].1;
            if !nested.iter().any(|p| p == rest) {
                nested.push(rest.to_string());
            }
        }
    }
    Ok(tree)
}

/// Load `paths` of `def`'s entity for rows grouped per parent, keeping the groups.
fn attach_grouped<X: LifeExecutor>(
    def: &RelationDef,
    paths: &[String],
    groups: &mut Vec<Vec<Row>>,
    executor: &X,
    config: &QueryConfig,
) -> Result<(), LifeError> {
    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    let mut flat: Vec<Row> = groups.drain(..).flatten().collect();
    attach_nested(def, paths, &mut flat, executor, config)?;
    let mut flat = flat.into_iter();
    *groups = sizes
        .into_iter()
        .map(|size| flat.by_ref().take(size).collect())
        .collect();
    Ok(())
}

/// Load `paths` of `def`'s entity for `rows` and attach them with [`Row::set_related`].
fn attach_nested<X: LifeExecutor>(
    def: &RelationDef,
    paths: &[String],
    rows: &mut [Row],
    executor: &X,
    config: &QueryConfig,
) -> Result<(), LifeError> {
    if rows.is_empty() {
        return Ok(());
    }
    for (name, nested) in path_tree(paths)? {
        let child = def.relation(&name)?;
        let mut related = fetch_related(&child, rows, executor, config)?;
        if !nested.is_empty() {
            attach_grouped(&child, &nested, &mut related, executor, config)?;
        }
        log::debug!(
            "Eager loaded nested relation `{}.{}` for {} rows",
            def.name,
            name,
            rows.len()
        );
        for (row, children) in rows.iter_mut().zip(related) {
            row.set_related(name.clone(), children);
        }
    }
    Ok(())
}

/// Related rows for each parent, aligned with `parents`.
pub(crate) fn fetch_related<X: LifeExecutor>(
    def: &RelationDef,
    parents: &[Row],
    executor: &X,
    config: &QueryConfig,
) -> Result<Vec<Vec<Row>>, LifeError> {
    if def.link.is_empty() {
        return Err(LifeError::ConfigurationError(format!(
            "Relation `{}` has no link columns",
            def.name
        )));
    }

    let mut base = def.query.clone();
    if let Some(on) = &def.on {
        base.filter = Some(combine(base.filter.take(), on.clone(), Logic::And));
    }
    let related_cols = def.link.related_columns();

    let grouped: Vec<Vec<Row>> = match &def.via {
        None => {
            let primary_cols = def.link.primary_columns();
            let rows = fetch_by_keys(&base, &related_cols, parents, &primary_cols, executor, config)?;
            let index = group_by_key(rows, &related_cols);
            parents
                .iter()
                .map(|parent| lookup(&index, parent.key_of(&primary_cols)))
                .collect()
        }
        Some(via) => {
            let junction_cols = via.link.related_columns();
            let primary_cols = via.link.primary_columns();
            let junction_rows =
                fetch_by_keys(&via.query, &junction_cols, parents, &primary_cols, executor, config)?;

            // The relation link points from the related table into the junction
            let target_cols = def.link.primary_columns();
            let rows = fetch_by_keys(&base, &related_cols, &junction_rows, &target_cols, executor, config)?;
            let related_index = group_by_key(rows, &related_cols);
            let junction_index = group_by_key(junction_rows, &junction_cols);

            parents
                .iter()
                .map(|parent| {
                    let mut seen = HashSet::new();
                    let mut matched = Vec::new();
                    for junction in lookup(&junction_index, parent.key_of(&primary_cols)) {
                        let Some(key) = junction.key_of(&target_cols) else { continue };
                        if !seen.insert(key.clone()) {
                            continue;
                        }
                        matched.extend(lookup(&related_index, Some(key)));
                    }
                    matched
                })
                .collect()
        }
    };

    Ok(grouped
        .into_iter()
        .map(|mut rows| {
            if !def.is_multiple() {
                rows.truncate(1);
            }
            rows
        })
        .collect())
}

/// Run `base` filtered to rows whose `columns` match the `key_columns` values
/// of `sources`, in batches of the configured size.
fn fetch_by_keys<S: AsRef<str>, X: LifeExecutor>(
    base: &Query,
    columns: &[S],
    sources: &[Row],
    key_columns: &[S],
    executor: &X,
    config: &QueryConfig,
) -> Result<Vec<Row>, LifeError> {
    let mut seen = HashSet::new();
    let mut keys: Vec<Vec<Value>> = Vec::new();
    for row in sources {
        let Some(key) = row.key_of(key_columns) else { continue };
        if seen.insert(key) {
            let values = key_columns
                .iter()
                .filter_map(|c| row.get(c.as_ref()).cloned())
                .collect();
            keys.push(values);
        }
    }

    let mut rows = Vec::new();
    for batch in keys.chunks(config.batch_size()) {
        let query = base.clone().filter(key_filter(columns, batch));
        let command = Command::from_query(&query, config.dialect)?;
        if config.log_statements {
            log::debug!("Eager loading: {}", command.sql);
        }
        rows.extend(command.query_all(executor)?);
    }
    Ok(rows)
}

/// `column IN (...)` for a single column, an OR of equalities for composite keys.
fn key_filter<S: AsRef<str>>(columns: &[S], keys: &[Vec<Value>]) -> Filter {
    if let [column] = columns {
        return Filter::is_in(column.as_ref(), keys.iter().filter_map(|k| k.first().cloned()));
    }
    keys.iter()
        .map(|key| {
            Filter::columns(
                columns
                    .iter()
                    .map(|c| c.as_ref().to_string())
                    .zip(key.iter().cloned()),
            )
        })
        .reduce(|acc, f| acc.or(f))
        .unwrap_or_else(Filter::none)
}

fn group_by_key<S: AsRef<str>>(rows: Vec<Row>, columns: &[S]) -> HashMap<String, Vec<Row>> {
    let mut index: HashMap<String, Vec<Row>> = HashMap::new();
    for row in rows {
        if let Some(key) = row.key_of(columns) {
            index.entry(key).or_default().push(row);
        }
    }
    index
}

fn lookup(index: &HashMap<String, Vec<Row>>, key: Option<String>) -> Vec<Row> {
    key.and_then(|k| index.get(&k).cloned()).unwrap_or_default()
}
