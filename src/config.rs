use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FacetqlError, Result};

/// Compiler configuration
///
/// Holds the field naming conventions of the target index together with the
/// constants used while building filters and facets. Every field is optional
/// when loading from JSON; missing keys fall back to the defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Prefix under which document fields are indexed
    pub field_prefix: String,
    /// Suffix of the keyword sub-field used for exact matching
    pub raw_suffix: String,
    /// Field holding the document type hierarchy
    pub type_field: String,
    /// Type that every document carries; `type=<base_type>` is not a filter
    pub base_type: String,
    /// Field holding the principals allowed to view a document
    pub permission_field: String,
    /// Field used for the default status exclusion
    pub status_field: String,
    /// Filter value (and bucket label) meaning "field is missing"
    pub no_value_label: String,
    /// Maximum number of buckets returned per terms facet
    pub max_facet_buckets: usize,
    /// Offset used to turn inclusive numeric bounds into half-open intervals
    pub zero_epsilon: f64,
    /// Request parameters that never produce filters
    pub reserved_params: Vec<String>,
    /// Statuses excluded unless the request filters on status itself
    pub excluded_statuses: Vec<String>,
    /// Add a terms facet for every filtered field that has no declared facet
    pub facet_filtered_fields: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            field_prefix: "embedded.".to_string(),
            raw_suffix: ".raw".to_string(),
            type_field: "@type".to_string(),
            base_type: "Item".to_string(),
            permission_field: "principals_allowed.view".to_string(),
            status_field: "status".to_string(),
            no_value_label: "No value".to_string(),
            max_facet_buckets: 100,
            zero_epsilon: f32::EPSILON as f64,
            reserved_params: [
                "q",
                "searchTerm",
                "limit",
                "from",
                "sort",
                "frame",
                "format",
                "field",
                "mode",
                "redirected_from",
                "datastore",
                "referrer",
                "currentAction",
                "additional_facet",
                "debug",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded_statuses: vec!["deleted".to_string(), "replaced".to_string()],
            facet_filtered_fields: true,
        }
    }
}

impl CompilerConfig {
    /// Load a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FacetqlError::InvalidRequest(format!("Invalid config: {}", e)))
    }

    /// Load a configuration from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Set the permission field
    pub fn with_permission_field(mut self, field: impl Into<String>) -> Self {
        self.permission_field = field.into();
        self
    }

    /// Set the statuses excluded by default
    pub fn with_excluded_statuses(mut self, statuses: Vec<String>) -> Self {
        self.excluded_statuses = statuses;
        self
    }

    /// Set the terms facet bucket cap
    pub fn with_max_facet_buckets(mut self, max: usize) -> Self {
        self.max_facet_buckets = max;
        self
    }

    /// Set the epsilon used for zero-crossing ranges and `[0, 0]` buckets
    pub fn with_zero_epsilon(mut self, epsilon: f64) -> Self {
        self.zero_epsilon = epsilon;
        self
    }

    /// Enable or disable implicit facets for filtered fields
    pub fn with_facet_filtered_fields(mut self, enabled: bool) -> Self {
        self.facet_filtered_fields = enabled;
        self
    }

    /// Check whether a request parameter is reserved
    pub fn is_reserved(&self, param: &str) -> bool {
        self.reserved_params.iter().any(|p| p == param)
    }

    /// Indexed field for a document field (used by range, stats and exists)
    pub fn value_field(&self, field: &str) -> String {
        format!("{}{}", self.field_prefix, field)
    }

    /// Keyword sub-field for a document field (used by terms and match)
    pub fn term_field(&self, field: &str) -> String {
        format!("{}{}{}", self.field_prefix, field, self.raw_suffix)
    }

    /// Indexed field for the type hierarchy
    pub fn type_query_field(&self) -> String {
        self.term_field(&self.type_field)
    }

    /// Strip the index prefix and keyword suffix from a query field
    pub fn base_field<'a>(&self, query_field: &'a str) -> &'a str {
        let field = query_field
            .strip_prefix(self.field_prefix.as_str())
            .unwrap_or(query_field);
        field
            .strip_suffix(self.raw_suffix.as_str())
            .unwrap_or(field)
    }
}
