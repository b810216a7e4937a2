//! Filter-to-query compiler
//!
//! Pipeline of a compile:
//! 1. `ParameterClassifier` turns request parameters into per-field specs
//! 2. `TermFilterBuilder` and `RangeFilterBuilder` emit fragments
//! 3. `NestedQueryGrouper` folds nested fragments into one wrapper per path
//! 4. The outer filter is assembled and `PermissionGuard` re-checks it
//! 5. Facets are planned and built against the assembled filter
//!
//! Every compile allocates its own state; a `SearchCompiler` can be shared
//! between threads.

mod classifier;
mod compound;
mod nested;
mod permission;
mod range;
mod terms;

pub use classifier::{ClassifiedFilters, FilterIntent, ParameterClassifier};
pub use compound::{Combine, CompoundCombinator, CompoundSearch, FilterBlock};
pub use nested::{NestedClauses, NestedFilter, NestedKey, NestedQueryGrouper};
pub use permission::{PermissionGuard, PrincipalSet};
pub use range::{default_time_of_day, RangeFilterBuilder, RangeSpec};
pub use terms::{FieldFilterSpec, FlatClauses, TermFilterBuilder};

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::CompilerConfig;
use crate::error::Result;
use crate::facets::{AggregationDocument, Facet, FacetAggregationBuilder, FacetPlanner, PlannedFacet};
use crate::metrics::CompilerMetrics;
use crate::query::nodes::BoolQuery;
use crate::query::{QueryDocument, QueryNode};
use crate::request::{AppliedFilter, SearchParams};
use crate::schema::FieldSchemaOracle;

/// Output of a compile
#[derive(Clone, Debug)]
pub struct CompiledSearch {
    pub query: QueryDocument,
    pub aggregations: AggregationDocument,
    pub filters_applied: Vec<AppliedFilter>,
    pub facets: Vec<PlannedFacet>,
}

impl CompiledSearch {
    /// Search request body: query and aggregations side by side
    pub fn search_body(&self) -> Value {
        let mut body = self.query.to_json();
        if let (Value::Object(body), Value::Object(aggs)) = (&mut body, self.aggregations.to_json()) {
            body.extend(aggs);
        }
        body
    }

    pub fn to_json(&self) -> Value {
        json!({
            "body": self.search_body(),
            "filters": self.filters_applied,
        })
    }
}

/// Compiles URL-style filters into query and aggregation documents
#[derive(Clone)]
pub struct SearchCompiler {
    config: CompilerConfig,
    oracle: Arc<dyn FieldSchemaOracle>,
    guard: PermissionGuard,
    metrics: Option<Arc<CompilerMetrics>>,
}

impl SearchCompiler {
    pub fn new(config: CompilerConfig, oracle: Arc<dyn FieldSchemaOracle>) -> Self {
        let guard = PermissionGuard::new(config.permission_field.clone());
        Self {
            config,
            oracle,
            guard,
            metrics: None,
        }
    }

    /// Record compiles and failures in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<CompilerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a search
    ///
    /// `doc_types` are the active result types (used for schema lookups and as
    /// the default type filter), `facets` the declared facets of those types.
    pub fn compile(
        &self,
        params: &SearchParams,
        doc_types: &[String],
        principals: &PrincipalSet,
        facets: &[Facet],
    ) -> Result<CompiledSearch> {
        let result = self.compile_search(params, doc_types, principals, facets);
        self.record(&result.as_ref().map(|c| c.facets.len()));
        result
    }

    /// Compile a search given as a query string
    pub fn compile_query_string(
        &self,
        query: &str,
        doc_types: &[String],
        principals: &PrincipalSet,
        facets: &[Facet],
    ) -> Result<CompiledSearch> {
        let params = SearchParams::parse(query)?;
        self.compile(&params, doc_types, principals, facets)
    }

    /// Compile every block of a compound search and combine the filters
    ///
    /// Blocks are permission-checked one by one; the combined document is not
    /// re-checked since its permission clauses sit below the outer `must`.
    pub fn compile_compound(
        &self,
        search: &CompoundSearch,
        doc_types: &[String],
        principals: &PrincipalSet,
    ) -> Result<QueryDocument> {
        if search.filter_blocks.is_empty() {
            let params = SearchParams::parse(search.global_flags.as_deref().unwrap_or(""))?;
            let types = self.lookup_types(&params, doc_types);
            return self.compile_filter(&params, &types, principals).map(|(_, doc)| doc);
        }

        let mut bodies = Vec::with_capacity(search.filter_blocks.len());
        for block in &search.filter_blocks {
            let params = SearchParams::parse(&search.block_query(block))?;
            let types = self.lookup_types(&params, doc_types);
            let (_, doc) = self.compile_filter(&params, &types, principals)?;
            bodies.push(doc.filter);
        }
        debug!(blocks = bodies.len(), mode = ?search.mode(), "combining compound search");
        Ok(QueryDocument::new(
            CompoundCombinator::new().combine(bodies, search.mode()),
        ))
    }

    /// Check a query document's permission clause against `principals`
    pub fn verify_permissions(&self, doc: &QueryDocument, principals: &PrincipalSet) -> Result<()> {
        let result = self.guard.verify_document(doc, principals);
        if let (Err(e), Some(metrics)) = (&result, &self.metrics) {
            metrics.record_error(e);
        }
        result
    }

    /// Assemble the outer filter of classified filters
    pub fn build_filter(
        &self,
        filters: &ClassifiedFilters,
        doc_types: &[String],
        principals: &PrincipalSet,
    ) -> QueryNode {
        let type_field = self.config.type_query_field();
        let types = if filters.type_terms.is_empty() {
            doc_types.to_vec()
        } else {
            filters.type_terms.clone()
        };

        let mut outer = BoolQuery::new()
            .must(QueryNode::terms(type_field.clone(), types))
            .must(self.guard.fragment(principals));
        if !filters.type_not_terms.is_empty() {
            outer = outer.must_not(QueryNode::terms(type_field, filters.type_not_terms.clone()));
        }

        let term_builder = TermFilterBuilder::new();
        let range_builder = RangeFilterBuilder::new(self.config.zero_epsilon);
        let mut nested = Vec::new();

        for spec in &filters.fields {
            if spec.is_nested() && !spec.is_path_identity() {
                nested.extend(term_builder.build_nested(spec));
                continue;
            }
            let clauses = term_builder.build_flat(spec);
            outer.must.extend(clauses.must);
            outer.must_not.extend(clauses.must_not);
        }

        for spec in &filters.ranges {
            let node = range_builder.build(spec);
            match &spec.nested_path {
                Some(path) => nested.push(NestedFilter::new(
                    NestedKey::Must,
                    path.clone(),
                    spec.query_field.clone(),
                    node,
                )),
                None => outer.must.push(node),
            }
        }

        let grouped = NestedQueryGrouper::new().group(nested);
        outer.must.extend(grouped.must);
        outer.must_not.extend(grouped.must_not);
        outer.into()
    }

    fn compile_search(
        &self,
        params: &SearchParams,
        doc_types: &[String],
        principals: &PrincipalSet,
        facets: &[Facet],
    ) -> Result<CompiledSearch> {
        let types = self.lookup_types(params, doc_types);
        let (filters, query) = self.compile_filter(params, &types, principals)?;

        let planned =
            FacetPlanner::new(&self.config, self.oracle.as_ref(), &types).plan(facets, params, &filters);
        let aggregations = FacetAggregationBuilder::new(&self.config).build(&planned, &query.filter)?;

        debug!(
            filters = filters.applied.len(),
            facets = planned.len(),
            "compiled search"
        );
        Ok(CompiledSearch {
            query,
            aggregations,
            filters_applied: filters.applied,
            facets: planned,
        })
    }

    /// Classify, assemble and guard the filter of one request
    ///
    /// `types` must already be resolved by `lookup_types`.
    fn compile_filter(
        &self,
        params: &SearchParams,
        types: &[String],
        principals: &PrincipalSet,
    ) -> Result<(ClassifiedFilters, QueryDocument)> {
        let filters = ParameterClassifier::new(&self.config, self.oracle.as_ref(), types).classify(params);
        let query = QueryDocument::new(self.build_filter(&filters, types, principals));
        self.guard.verify_document(&query, principals)?;
        Ok((filters, query))
    }

    /// Types to consult the schema with: the caller's, else the requested
    /// ones, else the base type
    fn lookup_types(&self, params: &SearchParams, doc_types: &[String]) -> Vec<String> {
        if !doc_types.is_empty() {
            return doc_types.to_vec();
        }
        let requested: Vec<String> = params
            .get_all("type")
            .into_iter()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if requested.is_empty() {
            vec![self.config.base_type.clone()]
        } else {
            requested
        }
    }

    fn record(&self, outcome: &std::result::Result<usize, &crate::FacetqlError>) {
        match outcome {
            Ok(facets) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_compile(*facets);
                }
            }
            Err(e) => {
                if !e.is_security_event() {
                    error!(error_type = e.error_type(), "search compile failed: {}", e);
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_error(e);
                }
            }
        }
    }
}

impl std::fmt::Debug for SearchCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCompiler")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

/// Check a query document against `principals` using the default
/// permission field
pub fn verify_permissions(doc: &QueryDocument, principals: &PrincipalSet) -> Result<()> {
    PermissionGuard::new(CompilerConfig::default().permission_field).verify_document(doc, principals)
}
