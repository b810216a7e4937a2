//! Term filters: positive and negated values per field plus the
//! "No value" existence coupling.

use crate::query::nodes::{BoolQuery, ExistsQuery, TermsQuery};
use crate::query::QueryNode;

use super::nested::{NestedFilter, NestedKey};

/// Accumulated term filters of one field
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilterSpec {
    /// Field as named in the request
    pub field: String,
    /// Keyword field that terms match against
    pub query_field: String,
    /// Field that existence checks use
    pub value_field: String,
    pub must_terms: Vec<String>,
    pub must_not_terms: Vec<String>,
    /// `Some(true)`: also match documents missing the field;
    /// `Some(false)`: the field must exist
    pub want_no_value: Option<bool>,
    /// Indexed path of the enclosing repeated sub-object
    pub nested_path: Option<String>,
    /// Added by the compiler rather than the request
    pub implicit: bool,
}

impl FieldFilterSpec {
    pub fn new(
        field: impl Into<String>,
        query_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            query_field: query_field.into(),
            value_field: value_field.into(),
            must_terms: Vec::new(),
            must_not_terms: Vec::new(),
            want_no_value: None,
            nested_path: None,
            implicit: false,
        }
    }

    pub fn with_nested_path(mut self, path: Option<String>) -> Self {
        self.nested_path = path;
        self
    }

    /// Record a term; repeats are ignored
    pub fn add_term(&mut self, value: &str, negated: bool) {
        let terms = if negated {
            &mut self.must_not_terms
        } else {
            &mut self.must_terms
        };
        if !terms.iter().any(|t| t == value) {
            terms.push(value.to_string());
        }
    }

    pub fn is_nested(&self) -> bool {
        self.nested_path.is_some()
    }

    /// The filter targets the nested path itself rather than a field under it
    pub fn is_path_identity(&self) -> bool {
        self.nested_path.as_deref() == Some(self.value_field.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.must_terms.is_empty() && self.must_not_terms.is_empty() && self.want_no_value.is_none()
    }
}

/// Clauses of a flat field for the outer filter
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatClauses {
    pub must: Option<QueryNode>,
    pub must_not: Option<QueryNode>,
}

/// Builds term filter fragments
#[derive(Clone, Copy, Debug, Default)]
pub struct TermFilterBuilder;

impl TermFilterBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Fragments of a field outside any repeated sub-object
    pub fn build_flat(&self, spec: &FieldFilterSpec) -> FlatClauses {
        let mut clauses = FlatClauses::default();

        let terms = (!spec.must_terms.is_empty()).then(|| {
            QueryNode::from(TermsQuery::new(
                spec.query_field.clone(),
                spec.must_terms.clone(),
            ))
        });

        match (terms, spec.want_no_value) {
            (Some(terms), None) => clauses.must = Some(terms),
            (Some(terms), Some(true)) => {
                clauses.must = Some(
                    BoolQuery::new()
                        .should(terms)
                        .should(QueryNode::missing(spec.value_field.clone()))
                        .into(),
                )
            }
            (Some(terms), Some(false)) => {
                clauses.must = Some(
                    BoolQuery::new()
                        .should(terms)
                        .should(ExistsQuery::new(spec.value_field.clone()))
                        .into(),
                )
            }
            (None, Some(true)) => {
                clauses.must_not = Some(QueryNode::exists(spec.value_field.clone()));
            }
            (None, Some(false)) => clauses.must = Some(QueryNode::exists(spec.value_field.clone())),
            (None, None) => {}
        }

        if !spec.must_not_terms.is_empty() {
            let negated: QueryNode =
                TermsQuery::new(spec.query_field.clone(), spec.must_not_terms.clone()).into();
            clauses.must_not = Some(match clauses.must_not.take() {
                // "No value" alone plus negated terms: neither may match
                Some(missing) => QueryNode::any_of(vec![missing, negated]),
                None => negated,
            });
        }

        clauses
    }

    /// Conditions of a field under a repeated sub-object, left for the grouper
    ///
    /// Values become single `match` nodes OR-ed together; `terms` does not
    /// compose inside nested scope.
    pub fn build_nested(&self, spec: &FieldFilterSpec) -> Vec<NestedFilter> {
        let Some(path) = spec.nested_path.as_deref() else {
            return Vec::new();
        };
        let mut filters = Vec::new();
        let entry = |key: NestedKey, node: QueryNode| {
            NestedFilter::new(key, path, spec.value_field.clone(), node)
        };

        let positive = self.any_match(&spec.query_field, &spec.must_terms);
        let exists = || QueryNode::exists(spec.value_field.clone());

        match (positive, spec.want_no_value) {
            (Some(node), None) => filters.push(entry(NestedKey::Must, node)),
            (Some(node), Some(false)) => filters.push(entry(
                NestedKey::Must,
                QueryNode::any_of(vec![node, exists()]),
            )),
            (None, Some(false)) => filters.push(entry(NestedKey::Must, exists())),
            (Some(node), Some(true)) => filters.push(entry(NestedKey::Should, node)),
            (None, Some(true)) => filters.push(entry(NestedKey::MustNot, exists())),
            (None, None) => {}
        }

        if let Some(node) = self.any_match(&spec.query_field, &spec.must_not_terms) {
            filters.push(entry(NestedKey::MustNot, node));
        }

        filters
    }

    fn any_match(&self, field: &str, values: &[String]) -> Option<QueryNode> {
        if values.is_empty() {
            return None;
        }
        Some(QueryNode::any_of(
            values
                .iter()
                .map(|v| QueryNode::match_value(field, v.clone()))
                .collect(),
        ))
    }
}
