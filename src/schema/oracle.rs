//! Field metadata lookups consumed by the compiler
//!
//! The compiler only needs three facts about a field: is it a date, is it a
//! number, and which repeated sub-object (if any) does it live under. Anything
//! that can answer `describe` can back a compile, including a remote schema
//! service wrapped in [`FnOracle`].

use super::field_type::FieldType;

/// What the schema knows about one field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub field_type: FieldType,
    /// Deepest nested ancestor of the field, without the index prefix
    pub nested_path: Option<String>,
    /// A missing value counts as zero for range filters
    pub no_value_means_zero: bool,
}

impl FieldInfo {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            nested_path: None,
            no_value_means_zero: false,
        }
    }

    pub fn with_nested_path(mut self, path: impl Into<String>) -> Self {
        self.nested_path = Some(path.into());
        self
    }

    pub fn with_no_value_means_zero(mut self, enabled: bool) -> Self {
        self.no_value_means_zero = enabled;
        self
    }
}

/// Read-only field metadata source
///
/// Implementations must be cheap and synchronous; a lookup that can time out
/// belongs behind an [`FnOracle`] whose closure owns the timeout.
pub trait FieldSchemaOracle: Send + Sync {
    /// Describe `field` for the given document types; `None` if unknown
    fn describe(&self, field: &str, doc_types: &[String]) -> Option<FieldInfo>;

    fn is_date_field(&self, field: &str, doc_types: &[String]) -> bool {
        self.describe(field, doc_types)
            .is_some_and(|info| info.field_type.is_date())
    }

    fn is_numeric_field(&self, field: &str, doc_types: &[String]) -> bool {
        self.describe(field, doc_types)
            .is_some_and(|info| info.field_type.is_numeric())
    }

    fn nested_path_of(&self, field: &str, doc_types: &[String]) -> Option<String> {
        self.describe(field, doc_types)
            .and_then(|info| info.nested_path)
    }

    fn no_value_means_zero(&self, field: &str, doc_types: &[String]) -> bool {
        self.describe(field, doc_types)
            .is_some_and(|info| info.no_value_means_zero)
    }
}

/// Oracle backed by an injected lookup closure
pub struct FnOracle<F> {
    lookup: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&str, &[String]) -> Option<FieldInfo> + Send + Sync,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> FieldSchemaOracle for FnOracle<F>
where
    F: Fn(&str, &[String]) -> Option<FieldInfo> + Send + Sync,
{
    fn describe(&self, field: &str, doc_types: &[String]) -> Option<FieldInfo> {
        (self.lookup)(field, doc_types)
    }
}

impl<F> std::fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOracle").finish_non_exhaustive()
    }
}
