//! Index mapping definitions
//!
//! Mappings describe one document type: the type of every field, which
//! sub-objects are nested, and the facets shown for the type.

use super::field_type::FieldType;
use crate::facets::Facet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field mapping configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field data type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// A missing value counts as zero for range filters
    #[serde(default)]
    pub no_value_means_zero: bool,

    /// Sub-field mappings (for object and nested types)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, FieldMapping>>,
}

impl FieldMapping {
    /// Create a new field mapping with the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn keyword() -> Self {
        Self::new(FieldType::Keyword)
    }

    pub fn long() -> Self {
        Self::new(FieldType::Long)
    }

    pub fn double() -> Self {
        Self::new(FieldType::Double)
    }

    pub fn date() -> Self {
        Self::new(FieldType::Date)
    }

    /// Create an object mapping with the given sub-fields
    pub fn object(properties: HashMap<String, FieldMapping>) -> Self {
        Self::new(FieldType::Object).with_properties(properties)
    }

    /// Create a nested mapping with the given sub-fields
    pub fn nested(properties: HashMap<String, FieldMapping>) -> Self {
        Self::new(FieldType::Nested).with_properties(properties)
    }

    /// Mark a missing value as equivalent to zero
    pub fn with_no_value_means_zero(mut self, enabled: bool) -> Self {
        self.no_value_means_zero = enabled;
        self
    }

    /// Set sub-field properties
    pub fn with_properties(mut self, properties: HashMap<String, FieldMapping>) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Field resolved against a mapping
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedField<'a> {
    pub mapping: &'a FieldMapping,
    /// Deepest nested ancestor of the field (the field itself included)
    pub nested_path: Option<String>,
}

/// Index mapping (schema) of one document type
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IndexMapping {
    /// Field mappings
    #[serde(default)]
    pub properties: HashMap<String, FieldMapping>,

    /// Facets declared for this type, in display order
    #[serde(default)]
    pub facets: Vec<Facet>,
}

impl IndexMapping {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field mapping
    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.properties.insert(name.into(), mapping);
        self
    }

    /// Add a facet declaration
    pub fn facet(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    /// Get a field mapping by path (supports dot notation)
    pub fn get_field(&self, path: &str) -> Option<&FieldMapping> {
        self.resolve(path).map(|resolved| resolved.mapping)
    }

    /// Resolve a dotted path, tracking the deepest nested ancestor on the way
    pub fn resolve(&self, path: &str) -> Option<ResolvedField<'_>> {
        let mut props = &self.properties;
        let mut nested_path = None;
        let mut current: Option<&FieldMapping> = None;
        let mut walked = Vec::new();

        for part in path.split('.') {
            if current.is_some() {
                props = current?.properties.as_ref()?;
            }
            let field = props.get(part)?;
            walked.push(part);
            if field.field_type.is_nested() {
                nested_path = Some(walked.join("."));
            }
            current = Some(field);
        }

        current.map(|mapping| ResolvedField {
            mapping,
            nested_path,
        })
    }

    /// Check if a field exists
    pub fn has_field(&self, path: &str) -> bool {
        self.get_field(path).is_some()
    }

    /// Get all field names (flattened with dot notation), sorted
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        Self::collect_field_names(&self.properties, "", &mut names);
        names.sort();
        names
    }

    fn collect_field_names(
        props: &HashMap<String, FieldMapping>,
        prefix: &str,
        names: &mut Vec<String>,
    ) {
        for (name, mapping) in props {
            let full_name = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };

            names.push(full_name.clone());

            if let Some(ref nested_props) = mapping.properties {
                Self::collect_field_names(nested_props, &full_name, names);
            }
        }
    }
}
