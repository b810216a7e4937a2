//! Query DSL parser
//!
//! Parses JSON query bodies back into `QueryNode` trees. Only the clauses the
//! compiler itself emits are accepted: bool (must/must_not/should), terms,
//! match, range, exists, and nested. Anything else is rejected as an
//! unsupported shape, so saved query bodies cannot smuggle in clauses the
//! permission guard does not understand.

use crate::error::FacetqlError;
use crate::query::ast::QueryNode;
use crate::query::nodes::{
    BoolQuery, ExistsQuery, MatchQuery, NestedQuery, RangeQuery, TermsQuery,
};
use crate::query::types::{RangeBounds, RangeValue};
use crate::Result;
use serde_json::{Map, Value};

/// Query parser for JSON DSL
pub struct QueryParser;

impl QueryParser {
    /// Parse a JSON query into an AST node
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
    pub fn parse(json: &Value) -> Result<QueryNode> {
        match json {
            Value::Object(map) => Self::parse_query_object(map),
            _ => Err(FacetqlError::UnsupportedQueryShape(
                "Query must be a JSON object".to_string(),
            )),
        }
    }

    /// Parse a JSON string into an AST node
    pub fn parse_str(json_str: &str) -> Result<QueryNode> {
        let value: Value = serde_json::from_str(json_str)
            .map_err(|e| FacetqlError::InvalidRequest(format!("Invalid JSON: {}", e)))?;
        Self::parse(&value)
    }

    /// Parse a full query document: `{ "query": { "bool": { "filter": <node> } } }`
    ///
    /// Returns the filter node.
    pub fn parse_document(json: &Value) -> Result<QueryNode> {
        let filter = json
            .get("query")
            .and_then(|q| q.get("bool"))
            .and_then(|b| b.get("filter"))
            .ok_or_else(|| {
                FacetqlError::UnsupportedQueryShape(
                    "Query document must have the form {\"query\": {\"bool\": {\"filter\": ...}}}"
                        .to_string(),
                )
            })?;
        Self::parse(filter)
    }

    fn parse_query_object(map: &Map<String, Value>) -> Result<QueryNode> {
        if map.len() != 1 {
            return Err(FacetqlError::UnsupportedQueryShape(format!(
                "Query object must have exactly one key, got: {:?}",
                map.keys().collect::<Vec<_>>()
            )));
        }

        // Handle wrapped query: { "query": { ... } }
        if let Some(query) = map.get("query") {
            return Self::parse(query);
        }
        if let Some(bool_query) = map.get("bool") {
            return Self::parse_bool(bool_query);
        }
        if let Some(terms_query) = map.get("terms") {
            return Self::parse_terms(terms_query);
        }
        if let Some(match_query) = map.get("match") {
            return Self::parse_match(match_query);
        }
        if let Some(range_query) = map.get("range") {
            return Self::parse_range(range_query);
        }
        if let Some(exists_query) = map.get("exists") {
            return Self::parse_exists(exists_query);
        }
        if let Some(nested_query) = map.get("nested") {
            return Self::parse_nested(nested_query);
        }

        Err(FacetqlError::UnsupportedQueryShape(format!(
            "Unknown query type. Expected one of: bool, terms, match, range, exists, nested. Got keys: {:?}",
            map.keys().collect::<Vec<_>>()
        )))
    }

    /// Parse a bool query
    fn parse_bool(value: &Value) -> Result<QueryNode> {
        let map = value.as_object().ok_or_else(|| {
            FacetqlError::UnsupportedQueryShape("bool query must be an object".to_string())
        })?;

        let mut query = BoolQuery::new();
        for (key, clauses) in map {
            match key.as_str() {
                "must" => query.must = Self::parse_clause_array(clauses)?,
                "must_not" => query.must_not = Self::parse_clause_array(clauses)?,
                "should" => query.should = Self::parse_clause_array(clauses)?,
                other => {
                    return Err(FacetqlError::UnsupportedQueryShape(format!(
                        "Unsupported bool clause: {}",
                        other
                    )))
                }
            }
        }

        Ok(query.into())
    }

    /// Parse an array of query clauses
    fn parse_clause_array(value: &Value) -> Result<Vec<QueryNode>> {
        match value {
            Value::Array(arr) => arr.iter().map(Self::parse).collect(),
            // Single clause can be provided without array wrapper
            obj @ Value::Object(_) => Ok(vec![Self::parse(obj)?]),
            _ => Err(FacetqlError::UnsupportedQueryShape(
                "Clause must be an array or object".to_string(),
            )),
        }
    }

    /// Extract the single `{ field: spec }` entry of a leaf query
    fn single_field<'a>(value: &'a Value, query_type: &str) -> Result<(&'a String, &'a Value)> {
        let map = value.as_object().ok_or_else(|| {
            FacetqlError::UnsupportedQueryShape(format!("{} query must be an object", query_type))
        })?;
        if map.len() != 1 {
            return Err(FacetqlError::UnsupportedQueryShape(format!(
                "{} query must specify exactly one field",
                query_type
            )));
        }
        map.iter().next().ok_or_else(|| {
            FacetqlError::UnsupportedQueryShape(format!("{} query must specify a field", query_type))
        })
    }

    fn scalar_to_string(value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(FacetqlError::UnsupportedQueryShape(format!(
                "Expected a scalar value, got: {}",
                value
            ))),
        }
    }

    /// Parse a terms query: `{ "field": ["value1", "value2", ...] }`
    fn parse_terms(value: &Value) -> Result<QueryNode> {
        let (field, terms_spec) = Self::single_field(value, "terms")?;

        let values = match terms_spec {
            Value::Array(arr) => arr
                .iter()
                .map(Self::scalar_to_string)
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(FacetqlError::UnsupportedQueryShape(
                    "terms query value must be an array".to_string(),
                ))
            }
        };

        Ok(TermsQuery::new(field.clone(), values).into())
    }

    /// Parse a match query: `{ "field": "text" }` or `{ "field": { "query": "text" } }`
    fn parse_match(value: &Value) -> Result<QueryNode> {
        let (field, spec) = Self::single_field(value, "match")?;

        let text = match spec {
            Value::Object(spec) => spec.get("query").map(Self::scalar_to_string).ok_or_else(|| {
                FacetqlError::UnsupportedQueryShape(
                    "match query spec must have 'query' field".to_string(),
                )
            })??,
            scalar => Self::scalar_to_string(scalar)?,
        };

        Ok(MatchQuery::new(field.clone(), text).into())
    }

    /// Parse a range query: `{ "field": { "gte": ..., "lte": ... } }`
    fn parse_range(value: &Value) -> Result<QueryNode> {
        let (field, range_spec) = Self::single_field(value, "range")?;

        let spec = range_spec.as_object().ok_or_else(|| {
            FacetqlError::UnsupportedQueryShape("range query spec must be an object".to_string())
        })?;

        let bounds = RangeBounds {
            gte: spec.get("gte").map(Self::parse_range_value),
            gt: spec.get("gt").map(Self::parse_range_value),
            lte: spec.get("lte").map(Self::parse_range_value),
            lt: spec.get("lt").map(Self::parse_range_value),
        };

        Ok(RangeQuery::new(field.clone()).with_bounds(bounds).into())
    }

    /// Parse a range value
    fn parse_range_value(value: &Value) -> RangeValue {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RangeValue::Long(i)
                } else if let Some(f) = n.as_f64() {
                    RangeValue::Double(f)
                } else {
                    RangeValue::String(n.to_string())
                }
            }
            Value::String(s) => RangeValue::String(s.clone()),
            _ => RangeValue::String(value.to_string()),
        }
    }

    /// Parse an exists query: `{ "field": "name" }`
    fn parse_exists(value: &Value) -> Result<QueryNode> {
        let field = value
            .get("field")
            .and_then(|f| f.as_str())
            .ok_or_else(|| {
                FacetqlError::UnsupportedQueryShape(
                    "exists query must have a string 'field'".to_string(),
                )
            })?;
        Ok(ExistsQuery::new(field).into())
    }

    /// Parse a nested query: `{ "path": "...", "query": { ... } }`
    fn parse_nested(value: &Value) -> Result<QueryNode> {
        let path = value.get("path").and_then(|p| p.as_str()).ok_or_else(|| {
            FacetqlError::UnsupportedQueryShape("nested query must have a string 'path'".to_string())
        })?;
        let inner = value.get("query").ok_or_else(|| {
            FacetqlError::UnsupportedQueryShape("nested query must have a 'query'".to_string())
        })?;
        Ok(NestedQuery::new(path, Self::parse(inner)?).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terms() {
        let json = r#"{ "terms": { "embedded.status.raw": ["released", "in review"] } }"#;
        let query = QueryParser::parse_str(json).unwrap();
        assert_eq!(query.query_type(), "terms");
        assert_eq!(query.as_terms().unwrap().values.len(), 2);
    }

    #[test]
    fn test_parse_terms_numbers_become_strings() {
        let json = r#"{ "terms": { "embedded.age.raw": [1, 2.5, true] } }"#;
        let query = QueryParser::parse_str(json).unwrap();
        assert_eq!(query.as_terms().unwrap().values, vec!["1", "2.5", "true"]);
    }

    #[test]
    fn test_parse_match_both_forms() {
        let short = QueryParser::parse_str(r#"{ "match": { "f": "x" } }"#).unwrap();
        let long = QueryParser::parse_str(r#"{ "match": { "f": { "query": "x" } } }"#).unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn test_parse_range_with_strings() {
        let json = r#"{ "range": { "embedded.date_created": { "gte": "2024-01-01 00:00", "lt": 5 } } }"#;
        let query = QueryParser::parse_str(json).unwrap();
        match query {
            QueryNode::Range(r) => {
                assert_eq!(r.bounds.gte, Some(RangeValue::String("2024-01-01 00:00".to_string())));
                assert_eq!(r.bounds.lt, Some(RangeValue::Long(5)));
            }
            other => panic!("expected range, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_bool() {
        let json = r#"{
            "nested": {
                "path": "embedded.families",
                "query": {
                    "bool": {
                        "must": [ { "match": { "embedded.families.proband.raw": "A" } } ],
                        "must_not": [ { "exists": { "field": "embedded.families.notes.raw" } } ]
                    }
                }
            }
        }"#;
        let query = QueryParser::parse_str(json).unwrap();
        let nested = query.as_nested().unwrap();
        assert_eq!(nested.path, "embedded.families");
        assert_eq!(nested.inner_bool().unwrap().clause_count(), 2);
    }

    #[test]
    fn test_parse_wrapped_query() {
        let json = r#"{ "query": { "exists": { "field": "embedded.age" } } }"#;
        let query = QueryParser::parse_str(json).unwrap();
        assert_eq!(query.query_type(), "exists");
    }

    #[test]
    fn test_parse_document() {
        let doc = serde_json::json!({
            "query": { "bool": { "filter": { "bool": { "must": [
                { "terms": { "principals_allowed.view": ["system.Everyone"] } }
            ] } } } }
        });
        let filter = QueryParser::parse_document(&doc).unwrap();
        assert_eq!(filter.as_bool().unwrap().must.len(), 1);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = QueryParser::parse_str("not valid json");
        assert!(matches!(result, Err(FacetqlError::InvalidRequest(_))));
    }

    #[test]
    fn test_parse_unknown_query_type() {
        let json = r#"{ "script": { "source": "true" } }"#;
        let result = QueryParser::parse_str(json);
        assert!(matches!(result, Err(FacetqlError::UnsupportedQueryShape(_))));
    }

    #[test]
    fn test_parse_unsupported_bool_clause() {
        let json = r#"{ "bool": { "filter": [ { "exists": { "field": "x" } } ] } }"#;
        assert!(matches!(
            QueryParser::parse_str(json),
            Err(FacetqlError::UnsupportedQueryShape(_))
        ));
    }

    #[test]
    fn test_parse_multi_key_object_rejected() {
        let json = r#"{ "terms": { "a": ["x"] }, "exists": { "field": "b" } }"#;
        assert!(QueryParser::parse_str(json).is_err());
    }
}
