pub mod compiler;
pub mod config;
pub mod error;
pub mod facets;
pub mod metrics;
pub mod query;
pub mod request;
pub mod schema;
pub mod testing;

pub use compiler::{
    verify_permissions, Combine, CompiledSearch, CompoundSearch, FilterBlock, PrincipalSet,
    SearchCompiler,
};
pub use config::CompilerConfig;
pub use error::{FacetqlError, Result};
pub use facets::{AggregationDocument, AggregationType, Facet, FacetRange};
pub use metrics::CompilerMetrics;
pub use query::{DocumentMatcher, QueryDocument, QueryNode};
pub use request::{AppliedFilter, RawParameter, SearchParams};
pub use schema::{FieldInfo, FieldSchemaOracle, FnOracle, SchemaRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
