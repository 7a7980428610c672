//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::aggregate::BucketAggregator;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::services::{IndexNames, LocationService, PersonService, RegistrationService};
use crate::store::{DocumentStore, HttpDocumentStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Search store handle; the only resource shared across requests.
    store: Arc<dyn DocumentStore>,

    /// Aggregated location listings.
    locations: LocationService,

    /// Registrations behind a place.
    registrations: RegistrationService,

    /// Primary person listing.
    persons: PersonService,

    /// Prometheus metrics.
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create application state backed by the configured search store.
    pub fn new(config: &Config) -> Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let store = HttpDocumentStore::new(config, metrics.clone())
            .context("failed to build search store client")?;
        info!(url = %config.search_url, "search store client ready");

        Ok(Self::with_store(config, Arc::new(store), metrics))
    }

    /// Create application state over an existing store handle.
    pub fn with_store(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let indexes = IndexNames::from_config(config);

        let aggregator = BucketAggregator::new(
            store.clone(),
            metrics.clone(),
            config.aggregation_bucket_cap,
            config.aggregation_timeout,
        );
        let registrations = RegistrationService::new(
            store.clone(),
            indexes.registrations.clone(),
            config.search_timeout,
        );
        let persons = PersonService::new(
            store.clone(),
            metrics.clone(),
            indexes.persons.clone(),
            config.search_timeout,
        );
        let locations = LocationService::new(aggregator, indexes);

        Self {
            inner: Arc::new(AppStateInner {
                store,
                locations,
                registrations,
                persons,
                metrics,
            }),
        }
    }

    /// Get the location listing service.
    pub fn locations(&self) -> &LocationService {
        &self.inner.locations
    }

    /// Get the registrations-by-place service.
    pub fn registrations(&self) -> &RegistrationService {
        &self.inner.registrations
    }

    /// Get the person listing service.
    pub fn persons(&self) -> &PersonService {
        &self.inner.persons
    }

    /// Get the metrics registry.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.inner.metrics
    }

    /// Check whether the search store answers.
    pub async fn store_healthy(&self) -> bool {
        self.inner.store.ping().await
    }
}
