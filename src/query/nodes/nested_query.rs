//! Nested query - evaluates an inner query against each instance of a repeated sub-object

use crate::query::ast::QueryNode;
use crate::query::nodes::BoolQuery;
use serde_json::{json, Value};

/// Query scoped to one instance of a repeated sub-object
///
/// Every clause of the inner query must hold for the same instance, which is
/// what separates `nested` from plain dotted-field matching.
#[derive(Clone, Debug, PartialEq)]
pub struct NestedQuery {
    /// Path of the repeated sub-object
    pub path: String,
    /// Query evaluated per instance
    pub query: Box<QueryNode>,
}

impl NestedQuery {
    pub fn new(path: impl Into<String>, query: impl Into<QueryNode>) -> Self {
        Self {
            path: path.into(),
            query: Box::new(query.into()),
        }
    }

    /// Borrow the inner bool query, if the inner query is a bool
    pub fn inner_bool(&self) -> Option<&BoolQuery> {
        match self.query.as_ref() {
            QueryNode::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "nested": { "path": self.path, "query": self.query.to_json() } })
    }
}
