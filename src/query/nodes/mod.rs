//! Concrete query node implementations
//!
//! Each node is plain data that renders to its Elasticsearch wire form.

mod bool_query;
mod exists_query;
mod match_query;
mod nested_query;
mod range_query;
mod terms_query;

pub use bool_query::BoolQuery;
pub use exists_query::ExistsQuery;
pub use match_query::MatchQuery;
pub use nested_query::NestedQuery;
pub use range_query::RangeQuery;
pub use terms_query::TermsQuery;
