//! Abstract Syntax Tree for query representation
//!
//! `QueryNode` is the compiler's whole output vocabulary. Every variant maps 1:1
//! onto an Elasticsearch Query DSL clause, and trees are plain values: builders
//! return new nodes instead of mutating shared ones.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::nodes::{BoolQuery, ExistsQuery, MatchQuery, NestedQuery, RangeQuery, TermsQuery};
use super::parser::QueryParser;

/// A node in the query tree
#[derive(Clone, Debug, PartialEq)]
pub enum QueryNode {
    Bool(BoolQuery),
    Terms(TermsQuery),
    Match(MatchQuery),
    Range(RangeQuery),
    Exists(ExistsQuery),
    Nested(NestedQuery),
}

impl QueryNode {
    /// `terms` clause
    pub fn terms(field: impl Into<String>, values: Vec<String>) -> Self {
        QueryNode::Terms(TermsQuery::new(field, values))
    }

    /// `match` clause
    pub fn match_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        QueryNode::Match(MatchQuery::new(field, value))
    }

    /// `exists` clause
    pub fn exists(field: impl Into<String>) -> Self {
        QueryNode::Exists(ExistsQuery::new(field))
    }

    /// `bool.must_not[exists]`: the field is missing
    pub fn missing(field: impl Into<String>) -> Self {
        BoolQuery::new().must_not(ExistsQuery::new(field)).into()
    }

    /// OR of the given nodes; a single node is returned unwrapped
    pub fn any_of(mut nodes: Vec<QueryNode>) -> Self {
        if nodes.len() == 1 {
            return nodes.remove(0);
        }
        QueryNode::Bool(BoolQuery {
            should: nodes,
            ..Default::default()
        })
    }

    /// Get the query type name for debugging and logging
    pub fn query_type(&self) -> &'static str {
        match self {
            QueryNode::Bool(_) => "bool",
            QueryNode::Terms(_) => "terms",
            QueryNode::Match(_) => "match",
            QueryNode::Range(_) => "range",
            QueryNode::Exists(_) => "exists",
            QueryNode::Nested(_) => "nested",
        }
    }

    /// Field of a leaf node; `None` for bool and nested
    pub fn field(&self) -> Option<&str> {
        match self {
            QueryNode::Terms(q) => Some(&q.field),
            QueryNode::Match(q) => Some(&q.field),
            QueryNode::Range(q) => Some(&q.field),
            QueryNode::Exists(q) => Some(&q.field),
            QueryNode::Bool(_) | QueryNode::Nested(_) => None,
        }
    }

    /// Every leaf field referenced anywhere below this node
    ///
    /// Nested paths are not fields and are not reported.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            QueryNode::Bool(b) => {
                for clause in b.must.iter().chain(&b.must_not).chain(&b.should) {
                    clause.collect_fields(out);
                }
            }
            QueryNode::Nested(n) => n.query.collect_fields(out),
            leaf => {
                if let Some(field) = leaf.field() {
                    out.push(field);
                }
            }
        }
    }

    pub fn as_bool(&self) -> Option<&BoolQuery> {
        match self {
            QueryNode::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_terms(&self) -> Option<&TermsQuery> {
        match self {
            QueryNode::Terms(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&NestedQuery> {
        match self {
            QueryNode::Nested(n) => Some(n),
            _ => None,
        }
    }

    /// Wire representation
    pub fn to_json(&self) -> Value {
        match self {
            QueryNode::Bool(q) => q.to_json(),
            QueryNode::Terms(q) => q.to_json(),
            QueryNode::Match(q) => q.to_json(),
            QueryNode::Range(q) => q.to_json(),
            QueryNode::Exists(q) => q.to_json(),
            QueryNode::Nested(q) => q.to_json(),
        }
    }
}

impl From<BoolQuery> for QueryNode {
    fn from(q: BoolQuery) -> Self {
        QueryNode::Bool(q)
    }
}

impl From<TermsQuery> for QueryNode {
    fn from(q: TermsQuery) -> Self {
        QueryNode::Terms(q)
    }
}

impl From<MatchQuery> for QueryNode {
    fn from(q: MatchQuery) -> Self {
        QueryNode::Match(q)
    }
}

impl From<RangeQuery> for QueryNode {
    fn from(q: RangeQuery) -> Self {
        QueryNode::Range(q)
    }
}

impl From<ExistsQuery> for QueryNode {
    fn from(q: ExistsQuery) -> Self {
        QueryNode::Exists(q)
    }
}

impl From<NestedQuery> for QueryNode {
    fn from(q: NestedQuery) -> Self {
        QueryNode::Nested(q)
    }
}

impl Serialize for QueryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        QueryParser::parse(&value).map_err(serde::de::Error::custom)
    }
}
