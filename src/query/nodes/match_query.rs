//! Match query - single-value match, used inside nested scope

use serde_json::{json, Value};

/// Query that matches a single value in a field
///
/// Nested filters use one `match` per value because a `terms` list does not
/// compose with other clauses on the same nested instance.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchQuery {
    /// Field to search in
    pub field: String,
    /// Value to match
    pub value: String,
}

impl MatchQuery {
    /// Create a new match query
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wire representation
    pub fn to_json(&self) -> Value {
        json!({ "match": { self.field.as_str(): self.value } })
    }
}
