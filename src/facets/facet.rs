//! Facet declarations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation backing a facet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationType {
    /// Top buckets by distinct value
    #[default]
    Terms,
    /// Fixed, declared buckets
    Range,
    /// min / max / avg / sum / count
    Stats,
    NestedTerms,
    NestedRange,
    NestedStats,
}

impl AggregationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Terms => "terms",
            AggregationType::Range => "range",
            AggregationType::Stats => "stats",
            AggregationType::NestedTerms => "nested-terms",
            AggregationType::NestedRange => "nested-range",
            AggregationType::NestedStats => "nested-stats",
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            AggregationType::NestedTerms | AggregationType::NestedRange | AggregationType::NestedStats
        )
    }

    /// Same aggregation evaluated inside a nested scope
    pub fn nested(self) -> Self {
        match self {
            AggregationType::Terms => AggregationType::NestedTerms,
            AggregationType::Range => AggregationType::NestedRange,
            AggregationType::Stats => AggregationType::NestedStats,
            nested => nested,
        }
    }

    /// Same aggregation without the nested scope
    pub fn flat(self) -> Self {
        match self {
            AggregationType::NestedTerms => AggregationType::Terms,
            AggregationType::NestedRange => AggregationType::Range,
            AggregationType::NestedStats => AggregationType::Stats,
            flat => flat,
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared bucket of a range facet; a missing end is unbounded
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

impl FacetRange {
    pub fn new(from: Option<f64>, to: Option<f64>) -> Self {
        Self { from, to }
    }

    /// Bucket of exactly zero
    pub fn is_zero_bucket(&self) -> bool {
        self.from == Some(0.0) && self.to == Some(0.0)
    }
}

fn default_missing_label() -> String {
    "No value".to_string()
}

/// A count breakdown shown next to search results
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub field: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub aggregation_type: AggregationType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<FacetRange>,
    /// Bucket label of documents missing the field
    #[serde(default = "default_missing_label")]
    pub missing_value_label: String,
}

impl Facet {
    /// Terms facet on `field`
    pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
            aggregation_type: AggregationType::Terms,
            ranges: Vec::new(),
            missing_value_label: default_missing_label(),
        }
    }

    pub fn with_type(mut self, aggregation_type: AggregationType) -> Self {
        self.aggregation_type = aggregation_type;
        self
    }

    /// Range facet buckets; also switches the facet to a range aggregation
    pub fn with_ranges(mut self, ranges: Vec<FacetRange>) -> Self {
        self.ranges = ranges;
        self.aggregation_type = if self.aggregation_type.is_nested() {
            AggregationType::NestedRange
        } else {
            AggregationType::Range
        };
        self
    }

    pub fn with_missing_value_label(mut self, label: impl Into<String>) -> Self {
        self.missing_value_label = label.into();
        self
    }

    /// Aggregation name: `<type>:<field with dots as dashes>`
    pub fn aggregation_name(&self) -> String {
        format!(
            "{}:{}",
            self.aggregation_type.as_str(),
            self.field.replace('.', "-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_name() {
        let facet = Facet::new("families.proband.display_title", "Proband");
        assert_eq!(
            facet.aggregation_name(),
            "terms:families-proband-display_title"
        );
        let facet = facet.with_type(AggregationType::NestedTerms);
        assert_eq!(
            facet.aggregation_name(),
            "nested-terms:families-proband-display_title"
        );
    }

    #[test]
    fn test_nested_and_flat_variants() {
        assert_eq!(AggregationType::Stats.nested(), AggregationType::NestedStats);
        assert_eq!(AggregationType::NestedStats.nested(), AggregationType::NestedStats);
        assert_eq!(AggregationType::NestedRange.flat(), AggregationType::Range);
        assert!(!AggregationType::Terms.is_nested());
    }

    #[test]
    fn test_facet_from_json_defaults() {
        let facet: Facet = serde_json::from_str(
            r#"{ "field": "age", "aggregation_type": "nested-range",
                 "ranges": [ { "from": 0, "to": 0 }, { "from": 1 } ] }"#,
        )
        .unwrap();
        assert_eq!(facet.aggregation_type, AggregationType::NestedRange);
        assert_eq!(facet.missing_value_label, "No value");
        assert!(facet.ranges[0].is_zero_bucket());
        assert_eq!(facet.ranges[1].to, None);
    }

    #[test]
    fn test_with_ranges_switches_type() {
        let facet = Facet::new("age", "Age").with_ranges(vec![FacetRange::new(Some(0.0), Some(10.0))]);
        assert_eq!(facet.aggregation_type, AggregationType::Range);
    }
}
