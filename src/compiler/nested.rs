//! Grouping of filters on repeated sub-objects
//!
//! Conditions on fields of the same nested path must share one `nested`
//! query, otherwise each condition is free to match a different instance and
//! `families.proband=A & families.clinic_notes=B` would also match a document
//! where A and B sit on two different families.

use tracing::debug;

use crate::query::nodes::{BoolQuery, ExistsQuery, NestedQuery};
use crate::query::QueryNode;

/// How a nested condition is folded into the query
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NestedKey {
    /// Must hold on the shared instance
    Must,
    /// Must not hold on the shared instance, or, for an `exists` node, no
    /// instance may carry the field
    MustNot,
    /// Either the shared instance matches, or it does not carry the field
    Should,
}

/// One condition on a field under a nested path
#[derive(Clone, Debug, PartialEq)]
pub struct NestedFilter {
    pub key: NestedKey,
    /// Indexed path of the repeated sub-object
    pub path: String,
    /// Indexed field the condition is on
    pub field: String,
    pub node: QueryNode,
}

impl NestedFilter {
    pub fn new(
        key: NestedKey,
        path: impl Into<String>,
        field: impl Into<String>,
        node: impl Into<QueryNode>,
    ) -> Self {
        Self {
            key,
            path: path.into(),
            field: field.into(),
            node: node.into(),
        }
    }
}

/// Clauses produced by the grouper for the outer filter
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NestedClauses {
    pub must: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
}

/// Folds nested conditions into one `nested` wrapper per path
#[derive(Clone, Copy, Debug, Default)]
pub struct NestedQueryGrouper;

impl NestedQueryGrouper {
    pub fn new() -> Self {
        Self
    }

    /// Group conditions by nested path
    ///
    /// `Must` conditions are processed first, then `MustNot`, then `Should`;
    /// order within a key is kept. The first condition on a path creates its
    /// wrapper and every later condition on that path lands in the same
    /// wrapper, except negative existence checks.
    pub fn group(&self, mut filters: Vec<NestedFilter>) -> NestedClauses {
        filters.sort_by_key(|f| f.key);

        let mut wrappers: Vec<(String, BoolQuery)> = Vec::new();
        let mut clauses = NestedClauses::default();

        for filter in filters {
            debug!(path = %filter.path, field = %filter.field, key = ?filter.key, "grouping nested condition");
            match filter.key {
                NestedKey::Must => {
                    let inner = Self::wrapper_for(&mut wrappers, &filter.path);
                    inner.must.push(filter.node);
                }
                NestedKey::MustNot if matches!(filter.node, QueryNode::Exists(_)) => {
                    // No instance may carry the field
                    clauses.must_not.push(
                        NestedQuery::new(filter.path, BoolQuery::new().must(filter.node)).into(),
                    );
                }
                NestedKey::MustNot => {
                    let inner = Self::wrapper_for(&mut wrappers, &filter.path);
                    inner.must_not.push(filter.node);
                }
                NestedKey::Should => {
                    // The instance matches, or it does not carry the field
                    let either = BoolQuery::new()
                        .should(filter.node)
                        .should(BoolQuery::new().must_not(ExistsQuery::new(filter.field)));
                    let inner = Self::wrapper_for(&mut wrappers, &filter.path);
                    inner.must.push(either.into());
                }
            }
        }

        clauses.must = wrappers
            .into_iter()
            .map(|(path, inner)| NestedQuery::new(path, inner).into())
            .collect();
        clauses
    }

    fn wrapper_for<'w>(wrappers: &'w mut Vec<(String, BoolQuery)>, path: &str) -> &'w mut BoolQuery {
        let index = match wrappers.iter().position(|(p, _)| p == path) {
            Some(index) => index,
            None => {
                wrappers.push((path.to_string(), BoolQuery::new()));
                wrappers.len() - 1
            }
        };
        &mut wrappers[index].1
    }
}
