//! Query vocabulary
//!
//! This module provides the query tree the compiler emits, supporting:
//! - Boolean queries (must, must_not, should)
//! - Terms queries (any-of exact match)
//! - Match queries (single value, used inside nested scope)
//! - Range queries (numeric/date ranges)
//! - Exists queries
//! - Nested queries (per-instance evaluation of repeated sub-objects)
//!
//! # Example
//!
//! ```json
//! {
//!   "query": {
//!     "bool": {
//!       "filter": {
//!         "bool": {
//!           "must": [
//!             { "terms": { "principals_allowed.view": ["system.Everyone"] } },
//!             { "range": { "embedded.date_created": { "gte": "2024-01-01 00:00" } } }
//!           ]
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

pub mod ast;
pub mod document;
pub mod matcher;
pub mod nodes;
pub mod parser;
pub mod types;

pub use ast::QueryNode;
pub use document::QueryDocument;
pub use matcher::DocumentMatcher;
pub use nodes::{BoolQuery, ExistsQuery, MatchQuery, NestedQuery, RangeQuery, TermsQuery};
pub use parser::QueryParser;
pub use types::*;
