use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use facetql::schema::{FieldInfo, FieldType, FnOracle};
use facetql::{CompilerConfig, DocumentMatcher, Facet, PrincipalSet, SearchCompiler, SearchParams};

fn build_compiler() -> SearchCompiler {
    let oracle = FnOracle::new(|field: &str, _: &[String]| match field {
        "age" => Some(FieldInfo::new(FieldType::Long).with_no_value_means_zero(true)),
        "date_created" => Some(FieldInfo::new(FieldType::Date)),
        f if f.starts_with("families.") => {
            Some(FieldInfo::new(FieldType::Keyword).with_nested_path("families"))
        }
        _ => Some(FieldInfo::new(FieldType::Keyword)),
    });
    SearchCompiler::new(CompilerConfig::default(), Arc::new(oracle))
}

/// Query string with `filters` parameters spread over flat, nested and range fields
fn make_query(filters: usize) -> String {
    (0..filters)
        .map(|i| match i % 4 {
            0 => format!("field_{}=value_{}", i, i),
            1 => format!("families.member_{}=value_{}", i % 3, i),
            2 => format!("age.from={}", i),
            _ => format!("field_{}!=No+value", i),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn make_facets(count: usize) -> Vec<Facet> {
    (0..count)
        .map(|i| Facet::new(format!("field_{}", i), format!("Field {}", i)))
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let compiler = build_compiler();
    let principals = PrincipalSet::new(["system.Everyone", "group.submitter"]);
    let doc_types = vec!["Cohort".to_string()];

    let mut group = c.benchmark_group("compile");
    for &filters in &[1usize, 10, 50] {
        let params = SearchParams::parse(&make_query(filters)).unwrap();
        let facets = make_facets(filters);
        group.bench_with_input(BenchmarkId::from_parameter(filters), &params, |b, params| {
            b.iter(|| {
                black_box(
                    compiler
                        .compile(params, &doc_types, &principals, &facets)
                        .unwrap(),
                );
            });
        });
    }
    group.finish();
}

fn bench_match_documents(c: &mut Criterion) {
    let compiler = build_compiler();
    let compiled = compiler
        .compile_query_string(
            "families.member_0=A&families.member_1=B&age.to=40",
            &["Cohort".to_string()],
            &PrincipalSet::new(["system.Everyone"]),
            &[],
        )
        .unwrap();
    let matcher = DocumentMatcher::default();

    let mut group = c.benchmark_group("match_documents");
    for &count in &[100usize, 1_000] {
        let docs: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "embedded": {
                        "@type": ["Cohort"],
                        "age": i % 80,
                        "families": [
                            { "member_0": "A", "member_1": if i % 2 == 0 { "B" } else { "C" } },
                            { "member_0": "D", "member_1": "B" }
                        ]
                    },
                    "principals_allowed": { "view": ["system.Everyone"] }
                })
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &docs, |b, docs| {
            b.iter(|| {
                black_box(matcher.filter(&compiled.query.filter, docs).len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_match_documents);
criterion_main!(benches);
