//! Testing infrastructure for correctness verification
//!
//! This module provides:
//! - Invariant checking framework over compiled searches
//! - Property-based testing support (see `tests/property_tests.rs`)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use facetql::testing::prelude::*;
//!
//! let compiled = compiler.compile(&params, &doc_types, &principals, &facets)?;
//! let violations = check_all_invariants(&compiled, &default_invariants(compiler.config()));
//! assert!(violations.is_empty());
//! ```
//!
//! # Invariants
//!
//! - **LeaveOneOutExcludesOwnField**: A facet's filter never constrains its own field
//! - **PermissionClausePresent**: Exactly one permission clause in the outer must
//! - **SingleNestedWrapperPerPath**: One nested query per path in the outer must

pub mod invariants;

pub use invariants::{
    check_all_invariants, default_invariants, Invariant, LeaveOneOutExcludesOwnField,
    PermissionClausePresent, SingleNestedWrapperPerPath, Violation,
};

/// Prelude for easy imports
pub mod prelude {
    pub use super::invariants::{
        check_all_invariants, default_invariants, Invariant, Violation,
    };
}
