//! Field type definitions
//!
//! Only the distinctions the filter compiler cares about are modelled: whether a
//! field takes range filters (numbers, dates) and whether it opens a repeated
//! sub-object (`nested`).

use serde::{Deserialize, Serialize};

/// Field data type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Full-text field with a `.raw` keyword sub-field
    #[default]
    Text,

    /// Exact match keyword field
    Keyword,

    /// 64-bit signed integer
    #[serde(alias = "integer")]
    Long,

    /// 64-bit floating point
    #[serde(alias = "float")]
    Double,

    /// Boolean value
    Boolean,

    /// Date/time field; range bounds are `yyyy-MM-dd` or `yyyy-MM-dd HH:mm`
    Date,

    /// Embedded object whose fields are flattened into the parent document
    Object,

    /// Repeated sub-object indexed as separate hidden documents
    ///
    /// Conditions on its fields must be grouped under one `nested` query to hold
    /// for the same instance.
    Nested,
}

impl FieldType {
    /// Check if this field takes numeric range filters
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Long | FieldType::Double)
    }

    /// Check if this field takes date range filters
    pub fn is_date(&self) -> bool {
        matches!(self, FieldType::Date)
    }

    /// Check if this field is a repeated sub-object
    pub fn is_nested(&self) -> bool {
        matches!(self, FieldType::Nested)
    }

    /// Check if this field type carries sub-field properties
    pub fn has_properties(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::Nested)
    }

    /// Check if this field type supports range queries and range/stats facets
    pub fn supports_range(&self) -> bool {
        self.is_numeric() || self.is_date()
    }
}
