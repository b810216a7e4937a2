//! Property-based tests for the compiler

use facetql::compiler::{RangeFilterBuilder, RangeSpec};
use facetql::query::{RangeOp, RangeValue};
use facetql::schema::{FieldInfo, FieldType, FnOracle};
use facetql::testing::{check_all_invariants, default_invariants};
use facetql::{
    verify_permissions, CompilerConfig, DocumentMatcher, Facet, FacetqlError, PrincipalSet,
    SearchCompiler, SearchParams,
};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn create_compiler() -> SearchCompiler {
    let oracle = FnOracle::new(|field: &str, _: &[String]| match field {
        "age" => Some(FieldInfo::new(FieldType::Long).with_no_value_means_zero(true)),
        f if f.starts_with("families.") => {
            Some(FieldInfo::new(FieldType::Keyword).with_nested_path("families"))
        }
        _ => Some(FieldInfo::new(FieldType::Keyword)),
    });
    SearchCompiler::new(CompilerConfig::default(), Arc::new(oracle))
}

/// Generate principal sets without duplicates
fn arb_principals() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("(group|userid|system)\\.[a-z]{3,8}", 1..6)
        .prop_map(|set| set.into_iter().collect())
}

/// Generate (field, negated, value) filters over a small field pool
fn arb_filters() -> impl Strategy<Value = Vec<(String, bool, String)>> {
    let field = prop::sample::select(vec![
        "sex",
        "lab",
        "status",
        "families.proband",
        "families.clinic_notes",
    ]);
    let value = prop_oneof![
        3 => "[A-Z]{1,3}",
        1 => Just("No value".to_string()),
    ];
    prop::collection::vec((field, any::<bool>(), value), 0..6).prop_map(|filters| {
        filters
            .into_iter()
            .map(|(f, negated, v)| (f.to_string(), negated, v))
            .collect()
    })
}

fn to_params(filters: &[(String, bool, String)]) -> SearchParams {
    let mut params = SearchParams::default();
    for (field, negated, value) in filters {
        let key = if *negated {
            format!("{}!", field)
        } else {
            field.clone()
        };
        params.push(key, value.clone());
    }
    params
}

proptest! {
    #[test]
    fn test_repeated_bounds_keep_the_widest(
        lowers in prop::collection::vec(-1000i64..1000, 1..6),
        uppers in prop::collection::vec(-1000i64..1000, 1..6)
    ) {
        let mut spec = RangeSpec::new("age", "embedded.age", false);
        for v in &lowers {
            spec.add_bound(RangeOp::Gte, &v.to_string());
        }
        for v in &uppers {
            spec.add_bound(RangeOp::Lte, &v.to_string());
        }

        let min = *lowers.iter().min().unwrap();
        let max = *uppers.iter().max().unwrap();
        prop_assert_eq!(spec.bounds.get(RangeOp::Gte), Some(&RangeValue::Long(min)));
        prop_assert_eq!(spec.bounds.get(RangeOp::Lte), Some(&RangeValue::Long(max)));
    }

    #[test]
    fn test_missing_values_follow_zero(
        lower in prop::option::of(-50i64..50),
        upper in prop::option::of(-50i64..50)
    ) {
        let mut spec = RangeSpec::new("age", "embedded.age", false).with_no_value_means_zero(true);
        if let Some(v) = lower {
            spec.add_bound(RangeOp::Gte, &v.to_string());
        }
        if let Some(v) = upper {
            spec.add_bound(RangeOp::Lte, &v.to_string());
        }

        let builder = RangeFilterBuilder::new(CompilerConfig::default().zero_epsilon);
        let expected = lower.map_or(true, |v| v <= 0) && upper.map_or(true, |v| v >= 0);
        prop_assert_eq!(builder.include_no_value(&spec), expected);

        let node = builder.build(&spec);
        let matcher = DocumentMatcher::default();
        prop_assert_eq!(matcher.matches(&node, &json!({ "embedded": {} })), expected);
        prop_assert_eq!(matcher.matches(&node, &json!({ "embedded": { "age": 0 } })), expected);
    }

    #[test]
    fn test_permission_check_ignores_order(
        principals in arb_principals().prop_shuffle(),
        seed in any::<prop::sample::Index>()
    ) {
        let compiled = create_compiler()
            .compile(&SearchParams::parse("sex=F").unwrap(), &[], &PrincipalSet::new(principals.clone()), &[])
            .unwrap();

        let mut rotated = principals.clone();
        let by = seed.index(rotated.len());
        rotated.rotate_left(by);
        prop_assert!(verify_permissions(&compiled.query, &PrincipalSet::new(rotated)).is_ok());
    }

    #[test]
    fn test_altered_principal_is_rejected(
        principals in arb_principals(),
        which in any::<prop::sample::Index>()
    ) {
        let compiled = create_compiler()
            .compile(&SearchParams::parse("sex=F").unwrap(), &[], &PrincipalSet::new(principals.clone()), &[])
            .unwrap();

        let mut altered = principals.clone();
        let i = which.index(altered.len());
        altered[i] = format!("{}X", altered[i]);

        let result = verify_permissions(&compiled.query, &PrincipalSet::new(altered));
        prop_assert!(
            matches!(result, Err(FacetqlError::PermissionIntegrity { .. })),
            "altered principals must be rejected"
        );
    }

    #[test]
    fn test_leave_one_out_never_constrains_own_field(filters in arb_filters()) {
        let declared = vec![
            Facet::new("sex", "Sex"),
            Facet::new("lab", "Lab"),
            Facet::new("families.proband", "Proband"),
        ];
        let config = CompilerConfig::default();
        let compiled = create_compiler()
            .compile(
                &to_params(&filters),
                &["Cohort".to_string()],
                &PrincipalSet::new(["system.Everyone"]),
                &declared,
            )
            .unwrap();

        let violations = check_all_invariants(&compiled, &default_invariants(&config));
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_assert_and_negate_matches_nothing(
        value in "[a-z]{1,6}",
        stored in prop::collection::vec("[a-z]{1,6}", 0..4)
    ) {
        let mut params = SearchParams::default();
        params.push("x", value.clone());
        params.push("x!", value);
        let compiled = create_compiler()
            .compile(&params, &["Cohort".to_string()], &PrincipalSet::new(["system.Everyone"]), &[])
            .unwrap();

        let doc = json!({
            "embedded": { "@type": ["Cohort"], "x": stored },
            "principals_allowed": { "view": ["system.Everyone"] }
        });
        prop_assert!(!DocumentMatcher::default().matches_document(&compiled.query, &doc));
    }
}
