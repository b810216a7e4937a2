//! Range query - matches documents with field values in a range

use crate::query::types::{RangeBounds, RangeOp, RangeValue};
use serde_json::{json, Value};

/// Query that matches documents with field values within a specified range
///
/// Works with numeric fields (Long, Double) and date fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeQuery {
    /// Field to search in
    pub field: String,
    /// Range bounds (gte, gt, lte, lt)
    pub bounds: RangeBounds,
}

impl RangeQuery {
    /// Create a new, unbounded range query
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            bounds: RangeBounds::default(),
        }
    }

    /// Set a bound
    pub fn bound(mut self, op: RangeOp, value: RangeValue) -> Self {
        self.bounds.set(op, value);
        self
    }

    /// Set the greater-than-or-equal bound
    pub fn gte(self, value: RangeValue) -> Self {
        self.bound(RangeOp::Gte, value)
    }

    /// Set the less-than-or-equal bound
    pub fn lte(self, value: RangeValue) -> Self {
        self.bound(RangeOp::Lte, value)
    }

    /// Set the bounds from a RangeBounds struct
    pub fn with_bounds(mut self, bounds: RangeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Check if this range is unbounded on the lower end
    pub fn is_unbounded_lower(&self) -> bool {
        self.bounds.gte.is_none() && self.bounds.gt.is_none()
    }

    /// Check if this range is unbounded on the upper end
    pub fn is_unbounded_upper(&self) -> bool {
        self.bounds.lte.is_none() && self.bounds.lt.is_none()
    }

    /// Wire representation
    pub fn to_json(&self) -> Value {
        let bounds = serde_json::to_value(&self.bounds).unwrap_or_else(|_| json!({}));
        json!({ "range": { self.field.as_str(): bounds } })
    }
}
