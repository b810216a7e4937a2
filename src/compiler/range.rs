//! Range filters: boundary merging, whole-day date defaulting and the
//! zero-means-missing coupling.

use chrono::NaiveDate;
use tracing::debug;

use crate::query::nodes::{BoolQuery, ExistsQuery, RangeQuery};
use crate::query::{QueryNode, RangeBounds, RangeOp, RangeValue};

/// Accumulated range boundaries of one field
#[derive(Clone, Debug, PartialEq)]
pub struct RangeSpec {
    /// Field as named in the request, without suffix
    pub field: String,
    /// Indexed field the range applies to
    pub query_field: String,
    pub bounds: RangeBounds,
    pub is_date: bool,
    /// A missing value is equivalent to zero for this field
    pub no_value_means_zero: bool,
    pub nested_path: Option<String>,
}

impl RangeSpec {
    pub fn new(field: impl Into<String>, query_field: impl Into<String>, is_date: bool) -> Self {
        Self {
            field: field.into(),
            query_field: query_field.into(),
            bounds: RangeBounds::default(),
            is_date,
            no_value_means_zero: false,
            nested_path: None,
        }
    }

    pub fn with_no_value_means_zero(mut self, enabled: bool) -> Self {
        self.no_value_means_zero = enabled;
        self
    }

    pub fn with_nested_path(mut self, path: Option<String>) -> Self {
        self.nested_path = path;
        self
    }

    /// Add a boundary, keeping the widest one per direction
    ///
    /// Lower bounds keep the smallest value, upper bounds the largest. Date
    /// literals are completed with a time of day before comparing.
    pub fn add_bound(&mut self, op: RangeOp, literal: &str) {
        let value = if self.is_date {
            RangeValue::String(default_time_of_day(literal, op))
        } else {
            RangeValue::from_literal(literal, true)
        };

        let keep_existing = match self.bounds.get(op) {
            Some(existing) if op.is_lower() => existing.compare(&value).is_le(),
            Some(existing) => existing.compare(&value).is_ge(),
            None => false,
        };
        if !keep_existing {
            self.bounds.set(op, value);
        }
    }
}

/// Complete a bare `yyyy-MM-dd` date so whole days are covered
///
/// Upper bounds (`lte`, `gt`) move to the end of the day, lower bounds
/// (`gte`, `lt`) to its start. Anything else is passed through.
pub fn default_time_of_day(literal: &str, op: RangeOp) -> String {
    if NaiveDate::parse_from_str(literal, "%Y-%m-%d").is_err() {
        return literal.to_string();
    }
    match op {
        RangeOp::Gt | RangeOp::Lte => format!("{} 23:59", literal),
        RangeOp::Gte | RangeOp::Lt => format!("{} 00:00", literal),
    }
}

/// Turns range specs into query nodes
#[derive(Clone, Debug)]
pub struct RangeFilterBuilder {
    epsilon: f64,
}

impl RangeFilterBuilder {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Whether the half-open interval of `spec` contains zero
    ///
    /// `lower = gte | gt + eps` (unbounded otherwise), `upper = lte + eps | lt`.
    pub fn includes_zero(&self, spec: &RangeSpec) -> bool {
        if spec.is_date {
            return false;
        }
        let bound = |op| spec.bounds.get(op).and_then(RangeValue::as_f64);

        let lower = bound(RangeOp::Gte)
            .or_else(|| bound(RangeOp::Gt).map(|v| v + self.epsilon))
            .unwrap_or(f64::NEG_INFINITY);
        let upper = bound(RangeOp::Lte)
            .map(|v| v + self.epsilon)
            .or_else(|| bound(RangeOp::Lt))
            .unwrap_or(f64::INFINITY);

        lower <= 0.0 && 0.0 < upper
    }

    /// Whether documents missing the field must be included
    pub fn include_no_value(&self, spec: &RangeSpec) -> bool {
        spec.no_value_means_zero && self.includes_zero(spec)
    }

    /// Range node of a spec, OR-ed with "missing" when zero is in range
    pub fn build(&self, spec: &RangeSpec) -> QueryNode {
        let range: QueryNode = RangeQuery::new(spec.query_field.clone())
            .with_bounds(spec.bounds.clone())
            .into();

        if !self.include_no_value(spec) {
            return range;
        }

        debug!(field = %spec.field, "range includes zero, matching missing values too");
        BoolQuery::new()
            .should(range)
            .should(BoolQuery::new().must_not(ExistsQuery::new(spec.query_field.clone())))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numeric(field: &str) -> RangeSpec {
        RangeSpec::new(field, format!("embedded.{}", field), false)
    }

    #[test]
    fn test_widening_merge() {
        let mut spec = numeric("age");
        spec.add_bound(RangeOp::Gte, "5");
        spec.add_bound(RangeOp::Gte, "3");
        spec.add_bound(RangeOp::Lte, "5");
        spec.add_bound(RangeOp::Lte, "9");
        spec.add_bound(RangeOp::Lte, "7");

        assert_eq!(spec.bounds.gte, Some(RangeValue::Long(3)));
        assert_eq!(spec.bounds.lte, Some(RangeValue::Long(9)));
    }

    #[test]
    fn test_numeric_merge_is_not_lexical() {
        let mut spec = numeric("age");
        spec.add_bound(RangeOp::Lte, "9");
        spec.add_bound(RangeOp::Lte, "10");
        assert_eq!(spec.bounds.lte, Some(RangeValue::Long(10)));
    }

    #[test]
    fn test_date_defaulting() {
        let mut spec = RangeSpec::new("date_created", "embedded.date_created", true);
        spec.add_bound(RangeOp::Gte, "2020-01-01");
        spec.add_bound(RangeOp::Lte, "2020-01-01");

        let builder = RangeFilterBuilder::new(f32::EPSILON as f64);
        assert_eq!(
            builder.build(&spec).to_json(),
            json!({ "range": { "embedded.date_created": {
                "gte": "2020-01-01 00:00",
                "lte": "2020-01-01 23:59"
            } } })
        );
    }

    #[test]
    fn test_date_merge_is_lexical_after_defaulting() {
        let mut spec = RangeSpec::new("date_created", "embedded.date_created", true);
        spec.add_bound(RangeOp::Lte, "2020-01-01 12:00");
        spec.add_bound(RangeOp::Lte, "2020-01-01");
        assert_eq!(
            spec.bounds.lte,
            Some(RangeValue::String("2020-01-01 23:59".to_string()))
        );
    }

    #[test]
    fn test_default_time_of_day() {
        assert_eq!(default_time_of_day("2021-03-04", RangeOp::Gt), "2021-03-04 23:59");
        assert_eq!(default_time_of_day("2021-03-04", RangeOp::Lt), "2021-03-04 00:00");
        assert_eq!(default_time_of_day("2021-03-04 10:00", RangeOp::Lte), "2021-03-04 10:00");
        assert_eq!(default_time_of_day("not a date", RangeOp::Gte), "not a date");
    }

    #[test]
    fn test_zero_inclusive() {
        let builder = RangeFilterBuilder::new(f32::EPSILON as f64);

        let mut spec = numeric("age").with_no_value_means_zero(true);
        spec.add_bound(RangeOp::Lte, "0");
        assert!(builder.includes_zero(&spec));
        assert_eq!(
            builder.build(&spec).to_json(),
            json!({ "bool": { "should": [
                { "range": { "embedded.age": { "lte": 0 } } },
                { "bool": { "must_not": [ { "exists": { "field": "embedded.age" } } ] } }
            ] } })
        );

        let mut spec = numeric("age").with_no_value_means_zero(true);
        spec.add_bound(RangeOp::Gte, "1");
        assert!(!builder.includes_zero(&spec));
        assert_eq!(builder.build(&spec).query_type(), "range");
    }

    #[test]
    fn test_zero_inclusive_exclusive_bounds() {
        let builder = RangeFilterBuilder::new(f32::EPSILON as f64);

        // gt=0 starts just above zero
        let mut spec = numeric("age");
        spec.bounds.set(RangeOp::Gt, RangeValue::Long(0));
        assert!(!builder.includes_zero(&spec));

        // lt=0 ends before zero
        let mut spec = numeric("age");
        spec.bounds.set(RangeOp::Lt, RangeValue::Long(0));
        assert!(!builder.includes_zero(&spec));

        let mut spec = numeric("age");
        spec.bounds.set(RangeOp::Gte, RangeValue::Long(-3));
        spec.bounds.set(RangeOp::Lt, RangeValue::Double(0.5));
        assert!(builder.includes_zero(&spec));
    }

    #[test]
    fn test_zero_without_flag_stays_plain() {
        let builder = RangeFilterBuilder::new(f32::EPSILON as f64);
        let mut spec = numeric("age");
        spec.add_bound(RangeOp::Gte, "0");
        assert!(builder.includes_zero(&spec));
        assert!(!builder.include_no_value(&spec));
        assert_eq!(builder.build(&spec).query_type(), "range");
    }
}
