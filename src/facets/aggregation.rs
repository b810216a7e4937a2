//! Facet aggregation requests

use std::collections::HashSet;

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::CompilerConfig;
use crate::error::{FacetqlError, Result};
use crate::query::QueryNode;

use super::facet::{AggregationType, FacetRange};
use super::leave_one_out::LeaveOneOut;
use super::plan::PlannedFacet;

/// Name of the global bucket every facet aggregation lives under
pub const ALL_ITEMS: &str = "all_items";
/// Unconstrained aggregation of a facet
pub const PRIMARY_AGG: &str = "primary_agg";
/// Aggregation pinned to the requested values
pub const REQUESTED_AGG: &str = "requested_agg";

/// Aggregation document of a search
///
/// Renders as `{"aggs": {"all_items": {"global": {}, "aggs": {...}}}}`. The
/// global bucket ignores the search query, so each facet's own leave-one-out
/// filter is the only restriction on its counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregationDocument {
    facets: Map<String, Value>,
}

impl AggregationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-facet entry (`{"aggs": ..., "filter": ...}`) by aggregation name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.facets.get(name)
    }

    /// Aggregation names in facet order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.facets.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    pub fn to_json(&self) -> Value {
        json!({ "aggs": { ALL_ITEMS: { "global": {}, "aggs": self.facets } } })
    }
}

impl Serialize for AggregationDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Builds one filtered aggregation per facet
pub struct FacetAggregationBuilder<'a> {
    config: &'a CompilerConfig,
    leave_one_out: LeaveOneOut<'a>,
}

impl<'a> FacetAggregationBuilder<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self {
            config,
            leave_one_out: LeaveOneOut::new(config),
        }
    }

    /// Aggregations of `facets` under the assembled `filter`
    pub fn build(&self, facets: &[PlannedFacet], filter: &QueryNode) -> Result<AggregationDocument> {
        let mut doc = AggregationDocument::new();
        let mut seen = HashSet::new();

        for planned in facets {
            let name = planned.aggregation_name();
            if name == ALL_ITEMS || !seen.insert(name.clone()) {
                return Err(FacetqlError::AggregationNameCollision(name));
            }

            let facet_filter = self.leave_one_out.filter_for(filter, &planned.facet.field)?;
            let aggs = self.facet_aggs(planned)?;
            debug!(aggregation = %name, "built facet aggregation");

            doc.facets.insert(
                name,
                json!({ "aggs": aggs, "filter": facet_filter.to_json() }),
            );
        }
        Ok(doc)
    }

    fn facet_aggs(&self, planned: &PlannedFacet) -> Result<Value> {
        let facet = &planned.facet;
        let mut aggs = Map::new();

        match facet.aggregation_type.flat() {
            AggregationType::Range => {
                aggs.insert(PRIMARY_AGG.to_string(), self.range_body(&facet.field, &facet.ranges));
            }
            AggregationType::Stats => {
                aggs.insert(
                    PRIMARY_AGG.to_string(),
                    json!({ "stats": { "field": self.config.value_field(&facet.field) } }),
                );
            }
            _ => {
                let field = self.config.term_field(&facet.field);
                aggs.insert(
                    PRIMARY_AGG.to_string(),
                    json!({ "terms": {
                        "field": field,
                        "size": self.config.max_facet_buckets,
                        "missing": facet.missing_value_label,
                    } }),
                );
                // `include` hides every other bucket, so the pinned values
                // get a sibling aggregation of their own
                if !planned.requested_values.is_empty() {
                    aggs.insert(
                        REQUESTED_AGG.to_string(),
                        json!({ "terms": {
                            "field": field,
                            "size": planned.requested_values.len(),
                            "missing": facet.missing_value_label,
                            "include": planned.requested_values,
                        } }),
                    );
                }
            }
        }

        if !facet.aggregation_type.is_nested() {
            return Ok(Value::Object(aggs));
        }
        let path = planned.nested_path.as_ref().ok_or_else(|| {
            FacetqlError::QueryConstruction(format!(
                "{} facet on {} has no nested path",
                facet.aggregation_type, facet.field
            ))
        })?;
        Ok(json!({ PRIMARY_AGG: { "nested": { "path": path }, "aggs": aggs } }))
    }

    fn range_body(&self, field: &str, ranges: &[FacetRange]) -> Value {
        let buckets: Vec<Value> = ranges
            .iter()
            .map(|range| {
                let mut bucket = Map::new();
                if let Some(from) = range.from {
                    bucket.insert("from".to_string(), json!(from));
                }
                // [0, 0] would be empty since `to` is exclusive
                let to = if range.is_zero_bucket() {
                    Some(self.config.zero_epsilon)
                } else {
                    range.to
                };
                if let Some(to) = to {
                    bucket.insert("to".to_string(), json!(to));
                }
                Value::Object(bucket)
            })
            .collect();

        json!({ "range": { "field": self.config.value_field(field), "ranges": buckets } })
    }
}
