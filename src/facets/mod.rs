//! Facets and their aggregations
//!
//! This module turns facet declarations into aggregation requests:
//! - Facet planning (declared, `additional_facet`, filtered fields)
//! - Leave-one-out filters per facet
//! - Terms / range / stats bodies, flat or nested, under one global bucket

mod aggregation;
mod facet;
mod leave_one_out;
mod plan;

pub use aggregation::{
    AggregationDocument, FacetAggregationBuilder, ALL_ITEMS, PRIMARY_AGG, REQUESTED_AGG,
};
pub use facet::{AggregationType, Facet, FacetRange};
pub use leave_one_out::LeaveOneOut;
pub use plan::{FacetPlanner, PlannedFacet};
