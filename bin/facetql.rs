use anyhow::{Context, Result};
use clap::Parser;
use facetql::testing::{check_all_invariants, default_invariants};
use facetql::{
    CompilerConfig, CompilerMetrics, DocumentMatcher, FieldSchemaOracle, PrincipalSet,
    SchemaRegistry, SearchCompiler, SearchParams,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "facetql")]
#[command(about = "Compile URL-style search filters into query and aggregation documents", long_about = None)]
struct Args {
    /// Query string to compile (e.g. "type=Cohort&status=released")
    #[arg(long, short)]
    query: String,

    /// Comma-separated principals of the caller
    #[arg(long, env = "FACETQL_PRINCIPALS", default_value = "system.Everyone")]
    principals: String,

    /// Schema file: JSON object of doc type -> mapping (with facets)
    #[arg(long, env = "FACETQL_SCHEMA")]
    schema: Option<PathBuf>,

    /// Compiler configuration overrides (JSON)
    #[arg(long, env = "FACETQL_CONFIG")]
    config: Option<PathBuf>,

    /// Active document types; defaults to the `type` parameters of the query
    #[arg(long, value_delimiter = ',')]
    doc_types: Vec<String>,

    /// Evaluate the compiled filter against the JSON document(s) in this file
    #[arg(long)]
    check: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Print compiler metrics after compiling
    #[arg(long)]
    metrics: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("facetql v{}", facetql::VERSION);

    let config = match &args.config {
        Some(path) => CompilerConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CompilerConfig::default(),
    };

    let registry = match &args.schema {
        Some(path) => SchemaRegistry::from_path(path)
            .with_context(|| format!("loading schema {}", path.display()))?,
        None => {
            warn!("No schema given, every field is treated as a plain keyword");
            SchemaRegistry::new()
        }
    };
    let registry = Arc::new(registry);

    let metrics = Arc::new(CompilerMetrics::new()?);
    let oracle: Arc<dyn FieldSchemaOracle> = registry.clone();
    let compiler = SearchCompiler::new(config, oracle).with_metrics(metrics.clone());

    let params = SearchParams::parse(&args.query)?;
    let doc_types = if args.doc_types.is_empty() {
        params
            .get_all("type")
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        args.doc_types.clone()
    };
    let principals = PrincipalSet::parse_list(&args.principals);
    let facets = registry.facets_for(&doc_types);

    info!(
        "Compiling {} parameter(s) for types {:?} with {} declared facet(s)",
        params.len(),
        doc_types,
        facets.len()
    );

    let compiled = compiler.compile(&params, &doc_types, &principals, &facets)?;

    for violation in check_all_invariants(&compiled, &default_invariants(compiler.config())) {
        warn!("{}", violation);
    }

    let output = compiled.to_json();
    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", serde_json::to_string(&output)?);
    }

    if let Some(path) = &args.check {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading documents {}", path.display()))?;
        let docs: serde_json::Value = serde_json::from_str(&contents)?;
        let docs = match docs {
            serde_json::Value::Array(docs) => docs,
            doc => vec![doc],
        };

        let matcher = DocumentMatcher::new(compiler.config().raw_suffix.clone());
        for (i, doc) in docs.iter().enumerate() {
            let matched = matcher.matches_document(&compiled.query, doc);
            println!("document {}: {}", i, if matched { "match" } else { "no match" });
        }
    }

    if args.metrics {
        print!("{}", metrics.gather()?);
    }

    Ok(())
}
