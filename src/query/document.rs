//! Top-level query document sent to the search engine

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use super::ast::QueryNode;
use super::parser::QueryParser;
use crate::Result;

/// Query document: `{ "query": { "bool": { "filter": <filter> } } }`
///
/// The filter is evaluated in filter context, so nothing in it affects scoring.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryDocument {
    pub filter: QueryNode,
}

impl QueryDocument {
    pub fn new(filter: QueryNode) -> Self {
        Self { filter }
    }

    /// Parse a query document from its wire form
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(Self::new(QueryParser::parse_document(value)?))
    }

    pub fn to_json(&self) -> Value {
        json!({ "query": { "bool": { "filter": self.filter.to_json() } } })
    }
}

impl Serialize for QueryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
