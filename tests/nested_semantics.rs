//! Nested sub-object filters
//!
//! Conditions on one repeated sub-object must hold within a single instance.

use facetql::query::QueryNode;
use facetql::schema::{FieldMapping, IndexMapping};
use facetql::{CompilerConfig, DocumentMatcher, PrincipalSet, SchemaRegistry, SearchCompiler};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn setup_compiler() -> SearchCompiler {
    let mut families = HashMap::new();
    families.insert("proband".to_string(), FieldMapping::keyword());
    families.insert("clinic_notes".to_string(), FieldMapping::keyword());
    families.insert("size".to_string(), FieldMapping::long());

    let registry = SchemaRegistry::new().register(
        "Cohort",
        IndexMapping::new()
            .field("families", FieldMapping::nested(families))
            .field("status", FieldMapping::keyword())
            .field("title", FieldMapping::text()),
    );
    SearchCompiler::new(CompilerConfig::default(), Arc::new(registry))
}

fn compile(query: &str) -> QueryNode {
    setup_compiler()
        .compile_query_string(
            query,
            &["Cohort".to_string()],
            &PrincipalSet::new(["system.Everyone"]),
            &[],
        )
        .unwrap()
        .query
        .filter
}

fn cohort(families: Value) -> Value {
    json!({
        "embedded": {
            "@type": ["Cohort", "Item"],
            "status": "released",
            "families": families
        },
        "principals_allowed": { "view": ["system.Everyone"] }
    })
}

fn nested_wrappers(filter: &QueryNode) -> Vec<&QueryNode> {
    filter
        .as_bool()
        .unwrap()
        .must
        .iter()
        .filter(|n| n.as_nested().is_some())
        .collect()
}

#[test]
fn test_one_wrapper_per_path() {
    let filter = compile("families.proband=A&families.clinic_notes=B");
    let wrappers = nested_wrappers(&filter);
    assert_eq!(wrappers.len(), 1);

    let nested = wrappers[0].as_nested().unwrap();
    assert_eq!(nested.path, "embedded.families");
    assert_eq!(
        nested.query.to_json(),
        json!({ "bool": { "must": [
            { "match": { "embedded.families.proband.raw": "A" } },
            { "match": { "embedded.families.clinic_notes.raw": "B" } }
        ] } })
    );
}

#[test]
fn test_intersection_is_per_instance() {
    let filter = compile("families.proband=A&families.clinic_notes=B");
    let matcher = DocumentMatcher::default();

    let same_instance = cohort(json!([
        { "proband": "A", "clinic_notes": "B" },
        { "proband": "C", "clinic_notes": "D" }
    ]));
    let swapped = cohort(json!([
        { "proband": "A", "clinic_notes": "D" },
        { "proband": "C", "clinic_notes": "B" }
    ]));

    assert!(matcher.matches(&filter, &same_instance));
    assert!(!matcher.matches(&filter, &swapped));
}

#[test]
fn test_values_on_one_nested_field_are_ored() {
    let filter = compile("families.proband=A&families.proband=C");
    let matcher = DocumentMatcher::default();

    assert!(matcher.matches(&filter, &cohort(json!([{ "proband": "C" }]))));
    assert!(!matcher.matches(&filter, &cohort(json!([{ "proband": "E" }]))));
}

#[test]
fn test_negated_nested_term_applies_per_instance() {
    let filter = compile("families.proband!=A");
    let wrappers = nested_wrappers(&filter);
    assert_eq!(wrappers.len(), 1);
    assert_eq!(
        wrappers[0].as_nested().unwrap().query.to_json(),
        json!({ "bool": { "must_not": [
            { "match": { "embedded.families.proband.raw": "A" } }
        ] } })
    );

    let matcher = DocumentMatcher::default();
    assert!(matcher.matches(&filter, &cohort(json!([{ "proband": "C" }, { "proband": "A" }]))));
    assert!(!matcher.matches(&filter, &cohort(json!([{ "proband": "A" }]))));
}

#[test]
fn test_nested_no_value_is_a_separate_negative_wrapper() {
    let filter = compile("families.proband=A&families.clinic_notes=No+value");
    let outer = filter.as_bool().unwrap();

    assert_eq!(nested_wrappers(&filter).len(), 1);
    let negative = outer
        .must_not
        .iter()
        .filter_map(QueryNode::as_nested)
        .collect::<Vec<_>>();
    assert_eq!(negative.len(), 1);
    assert_eq!(
        negative[0].query.to_json(),
        json!({ "bool": { "must": [
            { "exists": { "field": "embedded.families.clinic_notes" } }
        ] } })
    );

    let matcher = DocumentMatcher::default();
    assert!(matcher.matches(&filter, &cohort(json!([{ "proband": "A" }]))));
    assert!(!matcher.matches(
        &filter,
        &cohort(json!([{ "proband": "A" }, { "proband": "C", "clinic_notes": "B" }]))
    ));
}

#[test]
fn test_nested_value_or_no_value() {
    let filter = compile("families.clinic_notes=B&families.clinic_notes=No+value");
    let matcher = DocumentMatcher::default();

    assert!(matcher.matches(&filter, &cohort(json!([{ "clinic_notes": "B" }]))));
    assert!(matcher.matches(&filter, &cohort(json!([{ "proband": "A" }]))));
    assert!(!matcher.matches(&filter, &cohort(json!([{ "clinic_notes": "D" }]))));
}

#[test]
fn test_value_or_no_value_shares_the_instance() {
    let filter = compile("families.proband=A&families.proband=No+value&families.clinic_notes=B");
    let outer = filter.as_bool().unwrap();

    let nested_anywhere = outer
        .must
        .iter()
        .chain(&outer.must_not)
        .filter(|n| n.to_json().to_string().contains("\"nested\""))
        .count();
    assert_eq!(nested_anywhere, 1);
    assert_eq!(nested_wrappers(&filter).len(), 1);

    let matcher = DocumentMatcher::default();
    let split_across_families = cohort(json!([
        { "proband": "A", "clinic_notes": "X" },
        { "proband": "C", "clinic_notes": "B" }
    ]));
    assert!(!matcher.matches(&filter, &split_across_families));

    assert!(matcher.matches(
        &filter,
        &cohort(json!([{ "proband": "A", "clinic_notes": "B" }]))
    ));
    assert!(matcher.matches(
        &filter,
        &cohort(json!([{ "proband": "C" }, { "clinic_notes": "B" }]))
    ));
    assert!(!matcher.matches(
        &filter,
        &cohort(json!([{ "proband": "C", "clinic_notes": "B" }]))
    ));
}

#[test]
fn test_nested_range_joins_the_wrapper() {
    let filter = compile("families.proband=A&families.size.from=3");
    let wrappers = nested_wrappers(&filter);
    assert_eq!(wrappers.len(), 1);

    let matcher = DocumentMatcher::default();
    assert!(matcher.matches(
        &filter,
        &cohort(json!([{ "proband": "A", "size": 4 }]))
    ));
    assert!(!matcher.matches(
        &filter,
        &cohort(json!([{ "proband": "A", "size": 1 }, { "proband": "C", "size": 5 }]))
    ));
}

#[test]
fn test_flat_and_nested_mix() {
    let filter = compile("title=Study&families.proband=A");
    let outer = filter.as_bool().unwrap();
    assert!(outer.must.iter().any(|n| n
        .as_terms()
        .is_some_and(|t| t.field == "embedded.title.raw")));
    assert_eq!(nested_wrappers(&filter).len(), 1);
}
