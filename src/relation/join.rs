//! Relational joins for `join_with`.
//!
//! Each requested name is a dotted path of relations (`orders.items`),
//! optionally followed by an alias for its last segment (`orders.items i`).
//! Every path prefix is joined once; later requests reuse the earlier alias.

use crate::executor::LifeError;
use crate::query::base::{JoinClause, JoinKind, Query, TableSource};
use crate::query::condition::{combine, merge_params, Filter, Logic};
use crate::relation::def::{Link, RelationDef, RelationLookup};

struct Joined {
    path: String,
    alias: String,
    lookup: RelationLookup,
}

pub(crate) struct JoinBuilder<'a> {
    query: &'a mut Query,
    root_alias: String,
    root: RelationLookup,
    joined: Vec<Joined>,
}

impl<'a> JoinBuilder<'a> {
    pub(crate) fn new(query: &'a mut Query, root_alias: String, root: RelationLookup) -> Self {
        Self { query, root_alias, root, joined: Vec::new() }
    }

    /// Join the relation path in `spec` with `kind`.
    pub(crate) fn join(&mut self, spec: &str, kind: JoinKind) -> Result<(), LifeError> {
        let mut words = spec.split_whitespace();
        let path = words
            .next()
            .ok_or_else(|| LifeError::ConfigurationError("Empty relation name in join_with".to_string()))?;
        let alias = words.last();

        let segments: Vec<&str> = path.split('.').collect();
        let last = segments.len() - 1;
        let mut parent_alias = self.root_alias.clone();
        let mut parent_lookup = self.root;
        let mut prefix = String::new();

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(LifeError::ConfigurationError(format!(
                    "Malformed relation path `{path}`"
                )));
            }
            let full = if prefix.is_empty() {
                (*segment).to_string()
            } else {
                format!("{prefix}.{segment}")
            };

            let existing = self
                .joined
                .iter()
                .find(|j| j.path == full)
                .map(|j| (j.alias.clone(), j.lookup));
            let (child_alias, child_lookup) = match existing {
                Some(found) => found,
                None => {
                    let def = parent_lookup(segment)?;
                    let child_alias = alias
                        .filter(|_| i == last)
                        .or_else(|| def.alias())
                        .unwrap_or_else(|| def.table())
                        .to_string();
                    log::debug!("join_with: {full} as {child_alias} via {parent_alias}");
                    self.join_relation(&parent_alias, &def, &child_alias, kind)?;
                    self.joined.push(Joined {
                        path: full.clone(),
                        alias: child_alias.clone(),
                        lookup: def.lookup,
                    });
                    (child_alias, def.lookup)
                }
            };

            parent_alias = child_alias;
            parent_lookup = child_lookup;
            prefix = full;
        }
        Ok(())
    }

    fn join_relation(
        &mut self,
        parent_alias: &str,
        def: &RelationDef,
        child_alias: &str,
        kind: JoinKind,
    ) -> Result<(), LifeError> {
        let mut parent = parent_alias.to_string();

        if let Some(via) = &def.via {
            let junction = via.query.from.first().cloned().ok_or_else(|| {
                LifeError::ConfigurationError(format!(
                    "Junction query of relation `{}` has no table",
                    def.name
                ))
            })?;
            let junction_alias = junction.reference_name().to_string();
            self.query.joins.push(JoinClause {
                kind,
                table: junction,
                on: link_on(&via.link, &parent, &junction_alias),
            });
            self.merge_relation_query(&via.query);
            parent = junction_alias;
        }

        let on = match (link_on(&def.link, &parent, child_alias), &def.on) {
            (Some(link), Some(extra)) => Some(link.and(extra.clone())),
            (link, extra) => link.or_else(|| extra.clone()),
        };
        let table = def.table();
        self.query.joins.push(JoinClause {
            kind,
            table: TableSource {
                table: table.to_string(),
                alias: (child_alias != table).then(|| child_alias.to_string()),
            },
            on,
        });
        self.merge_relation_query(&def.query);
        Ok(())
    }

    /// Carry a relation query's filter, params and explicit joins into the main query.
    fn merge_relation_query(&mut self, relation: &Query) {
        if let Some(filter) = &relation.filter {
            self.query.filter = Some(combine(self.query.filter.take(), filter.clone(), Logic::And));
        }
        merge_params(&mut self.query.params, relation.params.clone());
        self.query.joins.extend(relation.joins.iter().cloned());
    }
}

/// `parent.primary = child.related` for every link pair, joined with AND.
fn link_on(link: &Link, parent_alias: &str, child_alias: &str) -> Option<Filter> {
    link.pairs()
        .iter()
        .map(|(related, primary)| {
            Filter::ColumnEq(format!("{parent_alias}.{primary}"), format!("{child_alias}.{related}"))
        })
        .reduce(|acc, f| acc.and(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_on_composite() {
        let link = Link::from([("customer_id", "id"), ("tenant_id", "tenant_id")]);
        let on = link_on(&link, "customer", "o").unwrap();
        assert_eq!(
            on,
            Filter::ColumnEq("customer.id".into(), "o.customer_id".into())
                .and(Filter::ColumnEq("customer.tenant_id".into(), "o.tenant_id".into()))
        );
        assert!(link_on(&Link::default(), "a", "b").is_none());
    }
}
