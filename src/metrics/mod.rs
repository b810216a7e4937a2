use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::error::FacetqlError;

/// Prometheus metrics for the compiler
#[derive(Clone)]
pub struct CompilerMetrics {
    // Counters
    pub queries_compiled: Counter,
    pub compile_errors: CounterVec,
    pub permission_violations: Counter,

    // Histograms
    pub facets_per_query: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl CompilerMetrics {
    /// Create a new CompilerMetrics instance with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let queries_compiled = Counter::with_opts(Opts::new(
            "facetql_queries_compiled_total",
            "Total number of searches compiled",
        ))?;
        registry.register(Box::new(queries_compiled.clone()))?;

        let compile_errors = CounterVec::new(
            Opts::new(
                "facetql_compile_errors_total",
                "Total number of failed compiles by error type",
            ),
            &["type"],
        )?;
        registry.register(Box::new(compile_errors.clone()))?;

        let permission_violations = Counter::with_opts(Opts::new(
            "facetql_permission_violations_total",
            "Permission filters that were missing or did not match the caller",
        ))?;
        registry.register(Box::new(permission_violations.clone()))?;

        let facets_per_query = Histogram::with_opts(
            HistogramOpts::new("facetql_facets_per_query", "Facet aggregations per compiled search")
                .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0]),
        )?;
        registry.register(Box::new(facets_per_query.clone()))?;

        Ok(Self {
            queries_compiled,
            compile_errors,
            permission_violations,
            facets_per_query,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a successful compile
    pub fn record_compile(&self, facets: usize) {
        self.queries_compiled.inc();
        self.facets_per_query.observe(facets as f64);
    }

    /// Record a failed compile or verification
    pub fn record_error(&self, error: &FacetqlError) {
        self.compile_errors
            .with_label_values(&[error.error_type()])
            .inc();
        if error.is_security_event() {
            self.permission_violations.inc();
        }
    }

    /// Render every metric in the Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
