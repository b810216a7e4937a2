//! Schema and field type system
//!
//! This module defines the field metadata the compiler consults:
//! - Field types (Text, Keyword, Long, Double, Boolean, Date, Object, Nested)
//! - Index mappings per document type, with their declared facets
//! - The `FieldSchemaOracle` lookup trait and its registry and closure backends

mod field_type;
mod mapping;
mod oracle;
mod registry;

pub use field_type::FieldType;
pub use mapping::{FieldMapping, IndexMapping, ResolvedField};
pub use oracle::{FieldInfo, FieldSchemaOracle, FnOracle};
pub use registry::SchemaRegistry;
