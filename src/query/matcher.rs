//! Reference evaluator for compiled queries
//!
//! Evaluates a `QueryNode` against an in-memory JSON document with the same
//! semantics the search engine applies:
//! - `terms` matches when any value of the field is in the list
//! - the keyword sub-field suffix (`.raw`) resolves to the field itself
//! - `nested` matches when a single instance of the repeated sub-object
//!   satisfies the whole inner query
//! - a `bool` with `should` clauses and no `must` clauses needs one `should` to match
//!
//! It exists to check compiled filters against fixtures, not to search.

use serde_json::Value;

use super::ast::QueryNode;
use super::document::QueryDocument;
use super::nodes::{BoolQuery, NestedQuery, RangeQuery};
use super::types::RangeValue;

/// Evaluates query trees against JSON documents
#[derive(Clone, Debug)]
pub struct DocumentMatcher {
    raw_suffix: String,
}

/// Instances of nested objects currently in scope, innermost last
#[derive(Clone, Debug)]
struct Scope<'a> {
    root: &'a Value,
    nested: Vec<(&'a str, &'a Value)>,
}

impl Default for DocumentMatcher {
    fn default() -> Self {
        Self::new(".raw")
    }
}

impl DocumentMatcher {
    /// Create a matcher that treats `raw_suffix` as the keyword sub-field suffix
    pub fn new(raw_suffix: impl Into<String>) -> Self {
        Self {
            raw_suffix: raw_suffix.into(),
        }
    }

    /// Check whether a document matches a query document's filter
    pub fn matches_document(&self, query: &QueryDocument, doc: &Value) -> bool {
        self.matches(&query.filter, doc)
    }

    /// Check whether a document matches a query
    pub fn matches(&self, query: &QueryNode, doc: &Value) -> bool {
        let scope = Scope {
            root: doc,
            nested: Vec::new(),
        };
        self.eval(query, &scope)
    }

    /// Return the documents that match, preserving order
    pub fn filter<'d>(&self, query: &QueryNode, docs: &'d [Value]) -> Vec<&'d Value> {
        docs.iter().filter(|doc| self.matches(query, doc)).collect()
    }

    fn eval<'a>(&self, query: &'a QueryNode, scope: &Scope<'a>) -> bool {
        match query {
            QueryNode::Bool(b) => self.eval_bool(b, scope),
            QueryNode::Terms(t) => self
                .resolve(&t.field, scope)
                .iter()
                .filter_map(|v| scalar_string(v))
                .any(|v| t.values.iter().any(|want| *want == v)),
            QueryNode::Match(m) => self
                .resolve(&m.field, scope)
                .iter()
                .filter_map(|v| scalar_string(v))
                .any(|v| v == m.value),
            QueryNode::Exists(e) => !self.resolve(&e.field, scope).is_empty(),
            QueryNode::Range(r) => self.eval_range(r, scope),
            QueryNode::Nested(n) => self.eval_nested(n, scope),
        }
    }

    fn eval_bool<'a>(&self, query: &'a BoolQuery, scope: &Scope<'a>) -> bool {
        if !query.must.iter().all(|q| self.eval(q, scope)) {
            return false;
        }
        if query.must_not.iter().any(|q| self.eval(q, scope)) {
            return false;
        }
        if !query.should.is_empty() && query.must.is_empty() {
            return query.should.iter().any(|q| self.eval(q, scope));
        }
        true
    }

    fn eval_range(&self, query: &RangeQuery, scope: &Scope<'_>) -> bool {
        self.resolve(&query.field, scope).iter().any(|v| {
            let value = match v {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => RangeValue::Long(i),
                    None => RangeValue::Double(n.as_f64().unwrap_or(f64::NAN)),
                },
                // ISO timestamps use 'T' where range bounds use a space
                Value::String(s) => RangeValue::String(s.replacen('T', " ", 1)),
                _ => return false,
            };
            query.bounds.contains(&value)
        })
    }

    fn eval_nested<'a>(&self, query: &'a NestedQuery, scope: &Scope<'a>) -> bool {
        let instances = self.resolve_objects(&query.path, scope);
        instances.into_iter().any(|instance| {
            let mut inner = scope.clone();
            inner.nested.push((query.path.as_str(), instance));
            self.eval(&query.query, &inner)
        })
    }

    /// Leaf values of a field, arrays flattened, nulls dropped
    fn resolve<'a>(&self, field: &str, scope: &Scope<'a>) -> Vec<&'a Value> {
        let field = field.strip_suffix(self.raw_suffix.as_str()).unwrap_or(field);
        let (base, relative) = Self::anchor(field, scope);
        let parts: Vec<&str> = relative.split('.').collect();
        let mut out = Vec::new();
        collect_values(base, &parts, &mut out);
        out.retain(|v| !v.is_object());
        out
    }

    /// Objects found at a nested path
    fn resolve_objects<'a>(&self, path: &str, scope: &Scope<'a>) -> Vec<&'a Value> {
        let (base, relative) = Self::anchor(path, scope);
        let parts: Vec<&str> = relative.split('.').collect();
        let mut out = Vec::new();
        collect_values(base, &parts, &mut out);
        out.retain(|v| v.is_object());
        out
    }

    /// Pick the innermost nested instance that owns the field
    fn anchor<'a, 'f>(field: &'f str, scope: &Scope<'a>) -> (&'a Value, &'f str) {
        for (path, instance) in scope.nested.iter().rev() {
            if let Some(rest) = field
                .strip_prefix(*path)
                .and_then(|rest| rest.strip_prefix('.'))
            {
                return (instance, rest);
            }
        }
        (scope.root, field)
    }
}

fn collect_values<'a>(value: &'a Value, parts: &[&str], out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_values(item, parts, out);
            }
        }
        Value::Null => {}
        Value::Object(map) if !parts.is_empty() => {
            if let Some(child) = map.get(parts[0]) {
                collect_values(child, &parts[1..], out);
            }
        }
        leaf => {
            if parts.is_empty() {
                out.push(leaf);
            }
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
