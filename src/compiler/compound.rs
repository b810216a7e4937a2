//! Compound (saved) searches: several filter blocks combined with OR or AND

use serde::{Deserialize, Serialize};

use crate::query::nodes::BoolQuery;
use crate::query::QueryNode;

/// How query bodies are combined
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// Match any body (`bool.should`)
    #[default]
    Or,
    /// Match every body (`bool.must`)
    And,
}

/// One block of a compound search
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBlock {
    /// Query string of the block
    pub query: String,
    /// Append the search's global flags to this block
    #[serde(default = "default_flags_applied")]
    pub flags_applied: bool,
}

fn default_flags_applied() -> bool {
    true
}

impl FilterBlock {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            flags_applied: true,
        }
    }

    pub fn without_flags(mut self) -> Self {
        self.flags_applied = false;
        self
    }
}

/// A saved search made of filter blocks
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundSearch {
    pub filter_blocks: Vec<FilterBlock>,
    /// AND the blocks instead of OR-ing them
    #[serde(default)]
    pub intersect: bool,
    /// Query string appended to every block with `flags_applied`
    #[serde(default)]
    pub global_flags: Option<String>,
}

impl CompoundSearch {
    pub fn mode(&self) -> Combine {
        if self.intersect {
            Combine::And
        } else {
            Combine::Or
        }
    }

    /// Full query string of a block
    pub fn block_query(&self, block: &FilterBlock) -> String {
        match (&self.global_flags, block.flags_applied) {
            (Some(flags), true) if !flags.is_empty() => {
                if block.query.is_empty() {
                    flags.clone()
                } else {
                    format!("{}&{}", block.query, flags)
                }
            }
            _ => block.query.clone(),
        }
    }
}

/// Combines already guarded query bodies
///
/// Bodies are not re-validated; each is expected to carry its own
/// permission clause.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompoundCombinator;

impl CompoundCombinator {
    pub fn new() -> Self {
        Self
    }

    pub fn combine(&self, bodies: Vec<QueryNode>, mode: Combine) -> QueryNode {
        match mode {
            Combine::Or => BoolQuery {
                should: bodies,
                ..Default::default()
            },
            Combine::And => BoolQuery {
                must: bodies,
                ..Default::default()
            },
        }
        .into()
    }
}
