//! Classification of request parameters into filter intents

use tracing::{debug, warn};

use crate::config::CompilerConfig;
use crate::query::RangeOp;
use crate::request::{AppliedFilter, SearchParams};
use crate::schema::FieldSchemaOracle;

use super::range::RangeSpec;
use super::terms::FieldFilterSpec;

/// What a single parameter asks for
#[derive(Clone, Debug, PartialEq)]
pub enum FilterIntent {
    /// Reserved key, no filter
    Skip,
    /// Restrict (or exclude, when negated) result types
    Type { value: String, negated: bool },
    /// Field value must (not) match
    Term {
        field: String,
        value: String,
        negated: bool,
    },
    /// Field must be missing (`negated`: must exist)
    NoValue { field: String, negated: bool },
    /// Range boundary on a date or numeric field
    Range {
        field: String,
        op: RangeOp,
        value: String,
    },
}

/// Every filter of a request, grouped per field in first-seen order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassifiedFilters {
    pub type_terms: Vec<String>,
    pub type_not_terms: Vec<String>,
    pub fields: Vec<FieldFilterSpec>,
    pub ranges: Vec<RangeSpec>,
    pub applied: Vec<AppliedFilter>,
}

impl ClassifiedFilters {
    pub fn field(&self, field: &str) -> Option<&FieldFilterSpec> {
        self.fields.iter().find(|spec| spec.field == field)
    }

    pub fn range(&self, field: &str) -> Option<&RangeSpec> {
        self.ranges.iter().find(|spec| spec.field == field)
    }

    /// Positive terms requested on `field`
    pub fn requested_values(&self, field: &str) -> Vec<String> {
        self.field(field)
            .map(|spec| spec.must_terms.clone())
            .unwrap_or_default()
    }
}

/// Turns raw parameters into per-field filter specs
pub struct ParameterClassifier<'a> {
    config: &'a CompilerConfig,
    oracle: &'a dyn FieldSchemaOracle,
    doc_types: &'a [String],
}

impl<'a> ParameterClassifier<'a> {
    pub fn new(
        config: &'a CompilerConfig,
        oracle: &'a dyn FieldSchemaOracle,
        doc_types: &'a [String],
    ) -> Self {
        Self {
            config,
            oracle,
            doc_types,
        }
    }

    /// Interpret one parameter
    ///
    /// A `.from`/`.to` suffix is a range boundary only on a date or numeric
    /// field; anywhere else the whole name, suffix included, is an ordinary
    /// term field.
    pub fn intent(&self, field: &str, value: &str) -> FilterIntent {
        if self.config.is_reserved(field) {
            return FilterIntent::Skip;
        }
        let (name, negated) = match field.strip_suffix('!') {
            Some(name) => (name, true),
            None => (field, false),
        };

        if name == "type" {
            if value == self.config.base_type && !negated {
                return FilterIntent::Skip;
            }
            return FilterIntent::Type {
                value: value.to_string(),
                negated,
            };
        }

        if value == self.config.no_value_label {
            return FilterIntent::NoValue {
                field: name.to_string(),
                negated,
            };
        }

        if let Some((stripped, op)) = range_suffix(name) {
            if !negated && self.is_rangeable(stripped) {
                return FilterIntent::Range {
                    field: stripped.to_string(),
                    op,
                    value: value.to_string(),
                };
            }
            warn!(field = %name, "range suffix on a field without range support, treating as term");
        }

        FilterIntent::Term {
            field: name.to_string(),
            value: value.to_string(),
            negated,
        }
    }

    /// Classify every parameter of a request
    pub fn classify(&self, params: &SearchParams) -> ClassifiedFilters {
        let mut out = ClassifiedFilters::default();

        for (index, param) in params.iter().enumerate() {
            let intent = self.intent(&param.field, &param.value);
            debug!(field = %param.field, value = %param.value, intent = ?intent, "classified parameter");

            match intent {
                FilterIntent::Skip => continue,
                FilterIntent::Type { value, negated } => {
                    let list = if negated {
                        &mut out.type_not_terms
                    } else {
                        &mut out.type_terms
                    };
                    if !list.contains(&value) {
                        list.push(value);
                    }
                }
                FilterIntent::Term {
                    field,
                    value,
                    negated,
                } => self.field_spec(&mut out.fields, &field).add_term(&value, negated),
                FilterIntent::NoValue { field, negated } => {
                    self.field_spec(&mut out.fields, &field).want_no_value = Some(!negated);
                }
                FilterIntent::Range { field, op, value } => {
                    self.range_spec(&mut out.ranges, &field).add_bound(op, &value);
                }
            }

            out.applied.push(AppliedFilter {
                field: param.field.clone(),
                term: param.value.clone(),
                remove: format!("?{}", params.without(index)),
            });
        }

        self.add_status_exclusion(&mut out);
        out
    }

    /// Hide excluded statuses unless the request filters on status itself
    fn add_status_exclusion(&self, out: &mut ClassifiedFilters) {
        let status = self.config.status_field.as_str();
        if self.config.excluded_statuses.is_empty()
            || out.field(status).is_some()
            || out.range(status).is_some()
        {
            return;
        }
        let mut spec = self.new_field_spec(status);
        for excluded in &self.config.excluded_statuses {
            spec.add_term(excluded, true);
        }
        spec.implicit = true;
        out.fields.push(spec);
    }

    fn is_rangeable(&self, field: &str) -> bool {
        self.oracle.is_date_field(field, self.doc_types)
            || self.oracle.is_numeric_field(field, self.doc_types)
    }

    fn field_spec<'s>(
        &self,
        specs: &'s mut Vec<FieldFilterSpec>,
        field: &str,
    ) -> &'s mut FieldFilterSpec {
        let index = match specs.iter().position(|s| s.field == field) {
            Some(index) => index,
            None => {
                specs.push(self.new_field_spec(field));
                specs.len() - 1
            }
        };
        &mut specs[index]
    }

    fn new_field_spec(&self, field: &str) -> FieldFilterSpec {
        FieldFilterSpec::new(
            field,
            self.config.term_field(field),
            self.config.value_field(field),
        )
        .with_nested_path(self.nested_path(field))
    }

    fn range_spec<'s>(&self, specs: &'s mut Vec<RangeSpec>, field: &str) -> &'s mut RangeSpec {
        let index = match specs.iter().position(|s| s.field == field) {
            Some(index) => index,
            None => {
                let spec = RangeSpec::new(
                    field,
                    self.config.value_field(field),
                    self.oracle.is_date_field(field, self.doc_types),
                )
                .with_no_value_means_zero(self.oracle.no_value_means_zero(field, self.doc_types))
                .with_nested_path(self.nested_path(field));
                specs.push(spec);
                specs.len() - 1
            }
        };
        &mut specs[index]
    }

    fn nested_path(&self, field: &str) -> Option<String> {
        self.oracle
            .nested_path_of(field, self.doc_types)
            .map(|path| self.config.value_field(&path))
    }
}

fn range_suffix(name: &str) -> Option<(&str, RangeOp)> {
    if let Some(stripped) = name.strip_suffix(".from") {
        return Some((stripped, RangeOp::Gte));
    }
    name.strip_suffix(".to").map(|stripped| (stripped, RangeOp::Lte))
}
