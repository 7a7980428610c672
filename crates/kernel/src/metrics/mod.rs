//! Prometheus metrics collection.
//!
//! Provides application metrics in Prometheus format.

use std::time::Duration;

use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// HTTP request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// Store request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StoreLabels {
    pub operation: String,
    pub outcome: String,
}

/// Store latency labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    pub operation: String,
}

/// Application metrics.
pub struct Metrics {
    registry: Registry,

    /// HTTP request counter by method/route/status.
    pub http_requests: Family<HttpLabels, Counter>,

    /// HTTP request duration histogram.
    pub http_duration_seconds: Family<HttpLabels, Histogram>,

    /// Search store requests by operation and outcome.
    pub store_requests: Family<StoreLabels, Counter>,

    /// Search store round-trip duration.
    pub store_duration_seconds: Family<OperationLabels, Histogram>,

    /// Aggregations that hit the bucket cap.
    pub aggregation_truncations: Counter,

    /// Rows whose nationality was backfilled from sibling records.
    pub enrichment_backfills: Counter,

    /// Supplied cursors that failed to decode.
    pub cursor_fallbacks: Counter,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<HttpLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total HTTP requests",
            http_requests.clone(),
        );

        let http_duration_seconds = Family::<HttpLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.001, 2.0, 12))
        });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_duration_seconds.clone(),
        );

        let store_requests = Family::<StoreLabels, Counter>::default();
        registry.register(
            "store_requests",
            "Search store requests",
            store_requests.clone(),
        );

        // Composite aggregations over the full corpus run for tens of seconds.
        let store_duration_seconds =
            Family::<OperationLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.005, 2.0, 14))
            });
        registry.register(
            "store_request_duration_seconds",
            "Search store request duration in seconds",
            store_duration_seconds.clone(),
        );

        let aggregation_truncations = Counter::default();
        registry.register(
            "aggregation_truncations",
            "Aggregations truncated at the bucket cap",
            aggregation_truncations.clone(),
        );

        let enrichment_backfills = Counter::default();
        registry.register(
            "enrichment_backfills",
            "Rows backfilled from sibling records",
            enrichment_backfills.clone(),
        );

        let cursor_fallbacks = Counter::default();
        registry.register(
            "cursor_fallbacks",
            "Undecodable cursors replaced by offset paging",
            cursor_fallbacks.clone(),
        );

        Self {
            registry,
            http_requests,
            http_duration_seconds,
            store_requests,
            store_duration_seconds,
            aggregation_truncations,
            enrichment_backfills,
            cursor_fallbacks,
        }
    }

    /// Record an HTTP request against its route template.
    pub fn record_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        let labels = HttpLabels {
            method: method.to_string(),
            path: route.to_string(),
            status,
        };

        self.http_requests.get_or_create(&labels).inc();
        self.http_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    /// Record one search store round trip.
    pub fn observe_store_request(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.store_requests
            .get_or_create(&StoreLabels {
                operation: operation.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
        self.store_duration_seconds
            .get_or_create(&OperationLabels {
                operation: operation.to_string(),
            })
            .observe(elapsed.as_secs_f64());
    }

    /// Record an aggregation truncated at the bucket cap.
    pub fn record_truncation(&self) {
        self.aggregation_truncations.inc();
    }

    /// Record backfilled rows.
    pub fn record_backfills(&self, rows: u64) {
        self.enrichment_backfills.inc_by(rows);
    }

    /// Record an undecodable cursor.
    pub fn record_cursor_fallback(&self) {
        self.cursor_fallbacks.inc();
    }

    /// Encode metrics in Prometheus text format.
    ///
    /// # Panics
    ///
    /// Panics if Prometheus metric encoding to a `String` buffer fails.
    /// The `fmt::Write` impl for `String` is infallible, and all metric
    /// labels use derived `EncodeLabelSet` impls that do not produce
    /// `fmt::Error`.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        // Prometheus encoding to String buffer is infallible
        #[allow(clippy::expect_used)]
        encode(&mut buffer, &self.registry).expect("encoding metrics");
        buffer
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}
