//! Invariant checking framework for compiled searches
//!
//! This module provides the trait and concrete implementations for
//! checking structural invariants of compiler output.

use crate::compiler::CompiledSearch;
use crate::config::CompilerConfig;
use crate::query::{QueryNode, QueryParser};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A violation of an invariant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub invariant: String,
    pub description: String,
    /// Offending query fragments, as JSON text
    pub fragments: Vec<String>,
    pub context: BTreeMap<String, String>,
}

impl Violation {
    fn new(invariant: &str, description: impl Into<String>) -> Self {
        Self {
            invariant: invariant.to_string(),
            description: description.into(),
            fragments: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    fn fragment(mut self, node: &QueryNode) -> Self {
        self.fragments.push(node.to_json().to_string());
        self
    }

    fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INVARIANT VIOLATION: {}", self.invariant)?;
        writeln!(f, "  Description: {}", self.description)?;
        for fragment in &self.fragments {
            writeln!(f, "  Fragment: {}", fragment)?;
        }
        if !self.context.is_empty() {
            writeln!(f, "  Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Trait for invariant checkers
pub trait Invariant: Send + Sync {
    /// Name of the invariant
    fn name(&self) -> &str;

    /// Check the invariant against a compiled search
    fn check(&self, search: &CompiledSearch) -> Result<(), Violation>;

    /// Human-readable description
    fn description(&self) -> &str {
        "No description provided"
    }
}

/// Check all invariants and return violations
pub fn check_all_invariants(
    search: &CompiledSearch,
    invariants: &[Box<dyn Invariant>],
) -> Vec<Violation> {
    invariants
        .iter()
        .filter_map(|invariant| invariant.check(search).err())
        .collect()
}

/// Every invariant, configured for `config`
pub fn default_invariants(config: &CompilerConfig) -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(LeaveOneOutExcludesOwnField::new(config.clone())),
        Box::new(PermissionClausePresent::new(config.permission_field.clone())),
        Box::new(SingleNestedWrapperPerPath),
    ]
}

// ============================================================================
// CONCRETE INVARIANTS
// ============================================================================

/// Invariant: a facet's filter never contains the facet's own filter
///
/// Permission and type fragments are exempt; they are never stripped.
pub struct LeaveOneOutExcludesOwnField {
    config: CompilerConfig,
}

impl LeaveOneOutExcludesOwnField {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    fn is_protected(&self, node: &QueryNode) -> bool {
        node.as_terms().is_some_and(|t| {
            t.field == self.config.permission_field || t.field == self.config.type_query_field()
        })
    }
}

impl Invariant for LeaveOneOutExcludesOwnField {
    fn name(&self) -> &str {
        "LeaveOneOutExcludesOwnField"
    }

    fn description(&self) -> &str {
        "A facet aggregation's filter must not contain a fragment on the facet's own field"
    }

    fn check(&self, search: &CompiledSearch) -> Result<(), Violation> {
        for planned in &search.facets {
            let name = planned.aggregation_name();
            let field = planned.facet.field.as_str();

            let raw = search
                .aggregations
                .get(&name)
                .and_then(|entry| entry.get("filter"))
                .ok_or_else(|| {
                    Violation::new(self.name(), "Facet has no aggregation filter")
                        .with("aggregation", name.clone())
                })?;
            let filter = QueryParser::parse(raw).map_err(|e| {
                Violation::new(self.name(), format!("Unparsable facet filter: {}", e))
                    .with("aggregation", name.clone())
            })?;
            let Some(outer) = filter.as_bool() else {
                return Err(Violation::new(self.name(), "Facet filter is not a bool query")
                    .with("aggregation", name)
                    .fragment(&filter));
            };

            for clause in outer.must.iter().chain(&outer.must_not) {
                if self.is_protected(clause) {
                    continue;
                }
                let own = clause
                    .referenced_fields()
                    .into_iter()
                    .any(|f| self.config.base_field(f) == field);
                if own {
                    return Err(Violation::new(
                        self.name(),
                        "Leave-one-out filter still constrains the facet field",
                    )
                    .with("aggregation", name)
                    .with("field", field)
                    .fragment(clause));
                }
            }
        }
        Ok(())
    }
}

/// Invariant: the outer filter carries exactly one permission clause
pub struct PermissionClausePresent {
    field: String,
}

impl PermissionClausePresent {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Invariant for PermissionClausePresent {
    fn name(&self) -> &str {
        "PermissionClausePresent"
    }

    fn description(&self) -> &str {
        "The assembled filter must hold one terms clause on the permission field in its outer must"
    }

    fn check(&self, search: &CompiledSearch) -> Result<(), Violation> {
        let count = search
            .query
            .filter
            .as_bool()
            .map(|b| {
                b.must
                    .iter()
                    .filter_map(QueryNode::as_terms)
                    .filter(|t| t.field == self.field)
                    .count()
            })
            .unwrap_or(0);

        if count == 1 {
            Ok(())
        } else {
            Err(
                Violation::new(self.name(), "Expected exactly one permission clause")
                    .with("field", self.field.clone())
                    .with("found", count.to_string())
                    .fragment(&search.query.filter),
            )
        }
    }
}

/// Invariant: the outer `must` holds at most one nested wrapper per path
pub struct SingleNestedWrapperPerPath;

impl Invariant for SingleNestedWrapperPerPath {
    fn name(&self) -> &str {
        "SingleNestedWrapperPerPath"
    }

    fn description(&self) -> &str {
        "Conditions on one nested path must share a single nested query"
    }

    fn check(&self, search: &CompiledSearch) -> Result<(), Violation> {
        let Some(outer) = search.query.filter.as_bool() else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for nested in outer.must.iter().filter_map(QueryNode::as_nested) {
            if !seen.insert(nested.path.as_str()) {
                return Err(
                    Violation::new(self.name(), "Nested path wrapped more than once")
                        .with("path", nested.path.clone()),
                );
            }
        }
        Ok(())
    }
}
