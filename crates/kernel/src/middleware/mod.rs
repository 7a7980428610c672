//! HTTP middleware components.
//!
//! Provides request metrics collection.

pub mod metrics;

pub use metrics::track_http_metrics;
