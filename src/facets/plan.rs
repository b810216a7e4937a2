//! Which facets a search computes

use tracing::debug;

use crate::compiler::ClassifiedFilters;
use crate::config::CompilerConfig;
use crate::request::SearchParams;
use crate::schema::FieldSchemaOracle;

use super::facet::Facet;

/// A facet resolved for one search
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedFacet {
    pub facet: Facet,
    /// Indexed nested path, for nested aggregation types
    pub nested_path: Option<String>,
    /// Values the request selected; always returned with their counts
    pub requested_values: Vec<String>,
}

impl PlannedFacet {
    pub fn aggregation_name(&self) -> String {
        self.facet.aggregation_name()
    }
}

/// Resolves declared, requested and implicit facets
pub struct FacetPlanner<'a> {
    config: &'a CompilerConfig,
    oracle: &'a dyn FieldSchemaOracle,
    doc_types: &'a [String],
}

impl<'a> FacetPlanner<'a> {
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

    /// Declared facets first, then `additional_facet` parameters, then one
    /// terms facet per filtered field; a field is faceted once
    pub fn plan(
        &self,
        declared: &[Facet],
        params: &SearchParams,
        filters: &ClassifiedFilters,
    ) -> Vec<PlannedFacet> {
        let mut facets: Vec<Facet> = Vec::new();
        let mut add = |facet: Facet| {
            if !facets.iter().any(|f| f.field == facet.field) {
                facets.push(facet);
            }
        };

        declared.iter().cloned().for_each(&mut add);
        for field in params.get_all("additional_facet") {
            if !field.is_empty() {
                add(self.implicit_facet(field));
            }
        }
        if self.config.facet_filtered_fields {
            for spec in filters.fields.iter().filter(|spec| !spec.implicit) {
                add(self.implicit_facet(&spec.field));
            }
        }

        facets
            .into_iter()
            .map(|facet| self.resolve(facet, filters))
            .collect()
    }

    fn implicit_facet(&self, field: &str) -> Facet {
        Facet::new(field, field).with_missing_value_label(self.config.no_value_label.clone())
    }

    fn resolve(&self, mut facet: Facet, filters: &ClassifiedFilters) -> PlannedFacet {
        let nested_path = self
            .oracle
            .nested_path_of(&facet.field, self.doc_types)
            .map(|path| self.config.value_field(&path));

        facet.aggregation_type = match nested_path {
            Some(_) => facet.aggregation_type.nested(),
            None => facet.aggregation_type.flat(),
        };

        let requested_values = filters
            .requested_values(&facet.field)
            .into_iter()
            .filter(|v| *v != self.config.no_value_label)
            .collect();

        debug!(field = %facet.field, aggregation = %facet.aggregation_type, "planned facet");
        PlannedFacet {
            facet,
            nested_path,
            requested_values,
        }
    }
}
