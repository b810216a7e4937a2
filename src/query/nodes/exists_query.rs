//! Exists query - matches documents that hold any value for a field

use serde_json::{json, Value};

/// Query that matches documents where a field is present
#[derive(Clone, Debug, PartialEq)]
pub struct ExistsQuery {
    pub field: String,
}

impl ExistsQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "exists": { "field": self.field } })
    }
}
