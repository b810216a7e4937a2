//! Leave-one-out filters
//!
//! A facet's counts are computed under every active filter except the ones on
//! the facet's own field, so a selected value does not hide its siblings.

use crate::config::CompilerConfig;
use crate::error::{FacetqlError, Result};
use crate::query::nodes::BoolQuery;
use crate::query::QueryNode;

/// Strips a facet's own filters from an assembled filter
#[derive(Clone, Debug)]
pub struct LeaveOneOut<'a> {
    config: &'a CompilerConfig,
}

impl<'a> LeaveOneOut<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self { config }
    }

    /// Copy of `filter` without the fragments on `facet_field`
    ///
    /// Only entries of the outer `must`/`must_not` are inspected. Inside a
    /// `nested` entry the inner clauses are stripped one by one and the
    /// wrapper is dropped once empty. Permission and type fragments are
    /// always kept.
    pub fn filter_for(&self, filter: &QueryNode, facet_field: &str) -> Result<QueryNode> {
        let outer = filter.as_bool().ok_or_else(|| {
            FacetqlError::QueryConstruction(format!(
                "assembled filter is a {} query, expected bool",
                filter.query_type()
            ))
        })?;

        Ok(BoolQuery {
            must: self.strip_clauses(&outer.must, facet_field)?,
            must_not: self.strip_clauses(&outer.must_not, facet_field)?,
            should: outer.should.clone(),
        }
        .into())
    }

    fn strip_clauses(&self, clauses: &[QueryNode], facet_field: &str) -> Result<Vec<QueryNode>> {
        let mut kept = Vec::with_capacity(clauses.len());
        for clause in clauses {
            if self.is_protected(clause) {
                kept.push(clause.clone());
                continue;
            }
            match clause {
                QueryNode::Nested(nested) => {
                    let inner = nested.inner_bool().ok_or_else(|| {
                        FacetqlError::QueryConstruction(format!(
                            "malformed nested query on path {}: inner query is {}",
                            nested.path,
                            nested.query.query_type()
                        ))
                    })?;
                    let stripped = BoolQuery {
                        must: self.without_field(&inner.must, facet_field),
                        must_not: self.without_field(&inner.must_not, facet_field),
                        should: self.without_field(&inner.should, facet_field),
                    };
                    if !stripped.is_empty() {
                        let mut copy = nested.clone();
                        *copy.query = stripped.into();
                        kept.push(copy.into());
                    }
                }
                other if self.only_references(other, facet_field) => {}
                other => kept.push(other.clone()),
            }
        }
        Ok(kept)
    }

    fn without_field(&self, clauses: &[QueryNode], facet_field: &str) -> Vec<QueryNode> {
        clauses
            .iter()
            .filter(|c| !self.only_references(c, facet_field))
            .cloned()
            .collect()
    }

    /// Every field below `node` is the facet field
    fn only_references(&self, node: &QueryNode, facet_field: &str) -> bool {
        let fields = node.referenced_fields();
        !fields.is_empty()
            && fields
                .iter()
                .all(|f| self.config.base_field(f) == facet_field)
    }

    fn is_protected(&self, node: &QueryNode) -> bool {
        match node.as_terms() {
            Some(terms) => {
                terms.field == self.config.permission_field
                    || terms.field == self.config.type_query_field()
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::nodes::{NestedQuery, RangeQuery};
    use crate::query::RangeValue;

    fn assembled() -> QueryNode {
        BoolQuery::new()
            .must(QueryNode::terms("embedded.@type.raw", vec!["Cohort".to_string()]))
            .must(QueryNode::terms(
                "principals_allowed.view",
                vec!["system.Everyone".to_string()],
            ))
            .must(QueryNode::terms("embedded.sex.raw", vec!["F".to_string()]))
            .must(QueryNode::any_of(vec![
                QueryNode::terms("embedded.age.raw", vec!["1".to_string()]),
                QueryNode::missing("embedded.age"),
            ]))
            .must(RangeQuery::new("embedded.date_created").gte(RangeValue::String(
                "2020-01-01 00:00".to_string(),
            )))
            .must(NestedQuery::new(
                "embedded.families",
                BoolQuery::new()
                    .must(QueryNode::match_value("embedded.families.proband.raw", "A"))
                    .must_not(QueryNode::match_value(
                        "embedded.families.clinic_notes.raw",
                        "X",
                    )),
            ))
            .must_not(QueryNode::terms(
                "embedded.status.raw",
                vec!["deleted".to_string()],
            ))
            .into()
    }

    fn fields_of(node: &QueryNode) -> Vec<String> {
        let config = CompilerConfig::default();
        node.referenced_fields()
            .into_iter()
            .map(|f| config.base_field(f).to_string())
            .collect()
    }

    #[test]
    fn test_strips_flat_terms() {
        let config = CompilerConfig::default();
        let loo = LeaveOneOut::new(&config)
            .filter_for(&assembled(), "sex")
            .unwrap();
        assert!(!fields_of(&loo).contains(&"sex".to_string()));
        assert!(fields_of(&loo).contains(&"status".to_string()));
        assert_eq!(loo.as_bool().unwrap().must.len(), 5);
    }

    #[test]
    fn test_strips_existence_wrapped_and_range() {
        let config = CompilerConfig::default();
        let loo = LeaveOneOut::new(&config);

        let without_age = loo.filter_for(&assembled(), "age").unwrap();
        assert!(!fields_of(&without_age).contains(&"age".to_string()));

        let without_date = loo.filter_for(&assembled(), "date_created").unwrap();
        assert!(!fields_of(&without_date).contains(&"date_created".to_string()));

        let without_status = loo.filter_for(&assembled(), "status").unwrap();
        assert!(without_status.as_bool().unwrap().must_not.is_empty());
    }

    #[test]
    fn test_strips_inside_nested() {
        let config = CompilerConfig::default();
        let loo = LeaveOneOut::new(&config)
            .filter_for(&assembled(), "families.proband")
            .unwrap();

        let nested = loo
            .as_bool()
            .unwrap()
            .must
            .iter()
            .find_map(QueryNode::as_nested)
            .unwrap();
        let inner = nested.inner_bool().unwrap();
        assert!(inner.must.is_empty());
        assert_eq!(inner.must_not.len(), 1);

        // Both conditions gone: wrapper dropped
        let only_proband: QueryNode = BoolQuery::new()
            .must(NestedQuery::new(
                "embedded.families",
                BoolQuery::new().must(QueryNode::match_value("embedded.families.proband.raw", "A")),
            ))
            .into();
        let loo = LeaveOneOut::new(&config)
            .filter_for(&only_proband, "families.proband")
            .unwrap();
        assert!(loo.as_bool().unwrap().is_empty());
    }

    #[test]
    fn test_strips_value_or_missing_inside_nested() {
        let config = CompilerConfig::default();
        let either = BoolQuery::new()
            .should(QueryNode::match_value("embedded.families.proband.raw", "A"))
            .should(BoolQuery::new().must_not(QueryNode::exists("embedded.families.proband")));
        let filter: QueryNode = BoolQuery::new()
            .must(NestedQuery::new(
                "embedded.families",
                BoolQuery::new()
                    .must(QueryNode::match_value("embedded.families.clinic_notes.raw", "B"))
                    .must(either),
            ))
            .into();

        let loo = LeaveOneOut::new(&config)
            .filter_for(&filter, "families.proband")
            .unwrap();
        let nested = loo.as_bool().unwrap().must[0].as_nested().unwrap();
        assert_eq!(
            fields_of(&nested.clone().into()),
            vec!["families.clinic_notes".to_string()]
        );

        let loo = LeaveOneOut::new(&config)
            .filter_for(&filter, "families.clinic_notes")
            .unwrap();
        let inner = loo.as_bool().unwrap().must[0]
            .as_nested()
            .unwrap()
            .inner_bool()
            .unwrap()
            .clone();
        assert_eq!(inner.must.len(), 1);
        assert!(inner.must[0].as_bool().is_some());
    }

    #[test]
    fn test_protected_fragments_survive() {
        let config = CompilerConfig::default();
        let loo = LeaveOneOut::new(&config);

        let no_type = loo.filter_for(&assembled(), "@type").unwrap();
        assert!(fields_of(&no_type).contains(&"@type".to_string()));

        let no_perm = loo
            .filter_for(&assembled(), "principals_allowed.view")
            .unwrap();
        assert!(fields_of(&no_perm).contains(&"principals_allowed.view".to_string()));
    }

    #[test]
    fn test_source_is_not_modified() {
        let config = CompilerConfig::default();
        let filter = assembled();
        let before = filter.clone();
        LeaveOneOut::new(&config).filter_for(&filter, "sex").unwrap();
        assert_eq!(filter, before);
    }

    #[test]
    fn test_malformed_nested_is_an_error() {
        let config = CompilerConfig::default();
        let filter: QueryNode = BoolQuery::new()
            .must(NestedQuery::new(
                "embedded.families",
                QueryNode::match_value("embedded.families.proband.raw", "A"),
            ))
            .into();
        let err = LeaveOneOut::new(&config)
            .filter_for(&filter, "sex")
            .unwrap_err();
        assert!(matches!(err, FacetqlError::QueryConstruction(_)));

        let err = LeaveOneOut::new(&config)
            .filter_for(&QueryNode::exists("embedded.age"), "age")
            .unwrap_err();
        assert!(matches!(err, FacetqlError::QueryConstruction(_)));
    }
}
