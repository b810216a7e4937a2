//! Permission filter construction and verification

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{FacetqlError, Result};
use crate::query::{QueryDocument, QueryNode};

/// The caller's effective principals
///
/// Order is kept for the emitted filter but ignored when verifying.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalSet(Vec<String>);

impl PrincipalSet {
    pub fn new<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(principals.into_iter().map(Into::into).collect())
    }

    /// Parse a comma separated list, ignoring blanks
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim).filter(|p| !p.is_empty()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_set(&self) -> BTreeSet<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for PrincipalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// Builds and re-checks the permission clause of assembled filters
#[derive(Clone, Debug)]
pub struct PermissionGuard {
    field: String,
}

impl PermissionGuard {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The `terms` clause restricting results to the principals
    pub fn fragment(&self, principals: &PrincipalSet) -> QueryNode {
        QueryNode::terms(self.field.clone(), principals.as_slice().to_vec())
    }

    /// Check that the filter's outer `must` carries exactly `principals`
    ///
    /// Every permission clause found must equal the principal set; finding
    /// none is as fatal as finding a wrong one.
    pub fn verify(&self, filter: &QueryNode, principals: &PrincipalSet) -> Result<()> {
        let expected = principals.as_set();
        let clauses: Vec<&Vec<String>> = filter
            .as_bool()
            .map(|b| {
                b.must
                    .iter()
                    .filter_map(QueryNode::as_terms)
                    .filter(|t| t.field == self.field)
                    .map(|t| &t.values)
                    .collect()
            })
            .unwrap_or_default();

        if clauses.is_empty() {
            error!(security = true, field = %self.field, "permission filter missing from assembled query");
            return Err(FacetqlError::MissingPermissionFilter);
        }

        for values in clauses {
            let found: BTreeSet<&str> = values.iter().map(String::as_str).collect();
            if found != expected {
                error!(
                    security = true,
                    expected = ?expected,
                    found = ?found,
                    "permission filter does not match caller principals"
                );
                return Err(FacetqlError::PermissionIntegrity {
                    expected: expected.iter().map(|s| s.to_string()).collect(),
                    found: found.iter().map(|s| s.to_string()).collect(),
                });
            }
        }
        Ok(())
    }

    /// Verify a whole query document
    pub fn verify_document(&self, doc: &QueryDocument, principals: &PrincipalSet) -> Result<()> {
        self.verify(&doc.filter, principals)
    }
}
