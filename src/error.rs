use thiserror::Error;

/// Main error type for filter compilation
#[derive(Error, Debug)]
pub enum FacetqlError {
    #[error("Query construction error: {0}")]
    QueryConstruction(String),

    #[error("Aggregation name collision: {0}")]
    AggregationNameCollision(String),

    #[error("Unsupported query shape: {0}")]
    UnsupportedQueryShape(String),

    #[error("Permission filter mismatch: expected {expected:?}, found {found:?}")]
    PermissionIntegrity {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Permission filter missing from assembled query")]
    MissingPermissionFilter,

    #[error("Field not found in schema: {0}")]
    SchemaLookupMiss(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, FacetqlError>;

impl FacetqlError {
    /// Whether this error signals a tampered or dropped permission filter
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            FacetqlError::PermissionIntegrity { .. } | FacetqlError::MissingPermissionFilter
        )
    }

    /// Whether the search must be aborted
    ///
    /// Schema lookup misses degrade the affected field to a plain term filter.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FacetqlError::SchemaLookupMiss(_))
    }

    /// Stable tag used in JSON error responses and metric labels
    pub fn error_type(&self) -> &'static str {
        match self {
            FacetqlError::QueryConstruction(_) => "query_construction_error",
            FacetqlError::AggregationNameCollision(_) => "aggregation_name_collision",
            FacetqlError::UnsupportedQueryShape(_) => "unsupported_query_shape",
            FacetqlError::PermissionIntegrity { .. } => "permission_integrity_error",
            FacetqlError::MissingPermissionFilter => "permission_integrity_error",
            FacetqlError::SchemaLookupMiss(_) => "schema_lookup_miss",
            FacetqlError::InvalidRequest(_) => "invalid_request",
            FacetqlError::Serialization(_) => "serialization_error",
            FacetqlError::Io(_) => "io_error",
        }
    }

    /// Message safe to show to the client
    ///
    /// Internal detail stays in the logs; only malformed input is echoed back.
    pub fn client_message(&self) -> String {
        match self {
            FacetqlError::InvalidRequest(msg) => format!("Invalid search request: {}", msg),
            _ => "Search failed".to_string(),
        }
    }
}
