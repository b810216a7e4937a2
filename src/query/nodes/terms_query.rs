//! Terms query - matches documents whose field holds any of the listed values

use serde_json::{json, Value};

/// Query that matches documents containing any of the specified values in a field
///
/// Serializes to `{ "terms": { "<field>": ["v1", "v2"] } }`.
#[derive(Clone, Debug, PartialEq)]
pub struct TermsQuery {
    /// Field to search in
    pub field: String,
    /// Values to match (document must contain at least one)
    pub values: Vec<String>,
}

impl TermsQuery {
    /// Create a new terms query
    pub fn new(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }

    /// Wire representation
    pub fn to_json(&self) -> Value {
        json!({ "terms": { self.field.as_str(): self.values } })
    }
}
