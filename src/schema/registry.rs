//! Per-type schema registry

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use super::mapping::IndexMapping;
use super::oracle::{FieldInfo, FieldSchemaOracle};
use crate::error::{FacetqlError, Result};
use crate::facets::Facet;

/// Mappings of every searchable document type
///
/// Loaded once at startup and shared read-only between compiles.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    mappings: BTreeMap<String, IndexMapping>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the mapping of a document type
    pub fn register(mut self, doc_type: impl Into<String>, mapping: IndexMapping) -> Self {
        self.mappings.insert(doc_type.into(), mapping);
        self
    }

    /// Load from a JSON object of `doc type -> mapping`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mappings: BTreeMap<String, IndexMapping> = serde_json::from_str(json)
            .map_err(|e| FacetqlError::InvalidRequest(format!("Invalid schema: {}", e)))?;
        Ok(Self { mappings })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn mapping(&self, doc_type: &str) -> Option<&IndexMapping> {
        self.mappings.get(doc_type)
    }

    pub fn doc_types(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(|k| k.as_str())
    }

    /// Declared facets of the given types, first declaration of a field wins
    pub fn facets_for(&self, doc_types: &[String]) -> Vec<Facet> {
        let mut facets: Vec<Facet> = Vec::new();
        for mapping in self.candidates(doc_types) {
            for facet in &mapping.facets {
                if !facets.iter().any(|f| f.field == facet.field) {
                    facets.push(facet.clone());
                }
            }
        }
        facets
    }

    /// Mappings to consult: the requested types that are registered, or all
    /// of them when none is (a search over the base type)
    fn candidates<'a>(&'a self, doc_types: &[String]) -> Vec<&'a IndexMapping> {
        let selected: Vec<&IndexMapping> = doc_types
            .iter()
            .filter_map(|t| self.mappings.get(t))
            .collect();
        if selected.is_empty() {
            self.mappings.values().collect()
        } else {
            selected
        }
    }
}

impl FieldSchemaOracle for SchemaRegistry {
    fn describe(&self, field: &str, doc_types: &[String]) -> Option<FieldInfo> {
        let found = self.candidates(doc_types).into_iter().find_map(|mapping| {
            mapping.resolve(field).map(|resolved| FieldInfo {
                field_type: resolved.mapping.field_type,
                nested_path: resolved.nested_path,
                no_value_means_zero: resolved.mapping.no_value_means_zero,
            })
        });

        if found.is_none() {
            let miss = FacetqlError::SchemaLookupMiss(field.to_string());
            warn!(field = %field, doc_types = ?doc_types, "{}", miss);
        }
        found
    }
}
