//! Boolean query - combines multiple clauses with AND, OR, NOT semantics

use crate::query::ast::QueryNode;
use serde_json::{Map, Value};

/// Boolean query combining multiple clauses
///
/// The boolean query supports three types of clauses:
/// - `must`: All clauses must match (AND).
/// - `must_not`: No clause must match (NOT).
/// - `should`: At least one clause should match (OR).
///
/// Empty clause lists are left out of the wire form.
///
/// # Example
///
/// ```json
/// {
///   "bool": {
///     "must": [
///       { "terms": { "embedded.status.raw": ["released"] } }
///     ],
///     "must_not": [
///       { "exists": { "field": "embedded.age" } }
///     ]
///   }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoolQuery {
    /// Clauses that must match (AND)
    pub must: Vec<QueryNode>,
    /// Clauses that must not match (NOT)
    pub must_not: Vec<QueryNode>,
    /// Clauses where at least one should match (OR)
    pub should: Vec<QueryNode>,
}

impl BoolQuery {
    /// Create a new empty boolean query
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a must clause
    pub fn must(mut self, query: impl Into<QueryNode>) -> Self {
        self.must.push(query.into());
        self
    }

    /// Add a must_not clause
    pub fn must_not(mut self, query: impl Into<QueryNode>) -> Self {
        self.must_not.push(query.into());
        self
    }

    /// Add a should clause
    pub fn should(mut self, query: impl Into<QueryNode>) -> Self {
        self.should.push(query.into());
        self
    }

    /// Total number of clauses
    pub fn clause_count(&self) -> usize {
        self.must.len() + self.must_not.len() + self.should.len()
    }

    /// Check if this query has no clauses
    pub fn is_empty(&self) -> bool {
        self.clause_count() == 0
    }

    /// Wire representation
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        for (key, clauses) in [
            ("must", &self.must),
            ("must_not", &self.must_not),
            ("should", &self.should),
        ] {
            if !clauses.is_empty() {
                body.insert(
                    key.to_string(),
                    Value::Array(clauses.iter().map(QueryNode::to_json).collect()),
                );
            }
        }
        let mut wrapper = Map::new();
        wrapper.insert("bool".to_string(), Value::Object(body));
        Value::Object(wrapper)
    }
}
