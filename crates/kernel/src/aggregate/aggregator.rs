//! Grouped-count aggregation over location dimensions.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{DimensionBucket, DimensionTuple};
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::query::{Predicate, keyword};
use crate::store::{Aggregation, CompositeSource, DocumentStore, SearchRequest, StoreError};

/// Most dimensions one aggregation may group on.
pub const MAX_DIMENSIONS: usize = 6;

/// Name of the composite aggregation in the request and response.
const AGGREGATION_NAME: &str = "places";

/// Runs one bounded grouped-count query per call.
///
/// The bucket cap is the only bound on group cardinality: when the store
/// returns a full page the result is truncated silently (logged and
/// counted) and no continuation is requested.
pub struct BucketAggregator {
    store: Arc<dyn DocumentStore>,
    metrics: Arc<Metrics>,
    bucket_cap: usize,
    timeout: Duration,
}

impl BucketAggregator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        metrics: Arc<Metrics>,
        bucket_cap: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            metrics,
            bucket_cap,
            timeout,
        }
    }

    /// Build the aggregation request; every dimension emits a missing bucket.
    pub fn build_request(&self, query: Predicate, dimensions: &[&str]) -> AppResult<SearchRequest> {
        if dimensions.is_empty() || dimensions.len() > MAX_DIMENSIONS {
            return Err(AppError::Internal(anyhow::anyhow!(
                "aggregation needs 1..={MAX_DIMENSIONS} dimensions, got {}",
                dimensions.len()
            )));
        }

        let sources = dimensions
            .iter()
            .map(|field| CompositeSource {
                name: field.to_string(),
                field: keyword(field),
                missing_bucket: true,
            })
            .collect();

        Ok(SearchRequest::aggregation(
            query,
            AGGREGATION_NAME,
            Aggregation::Composite {
                size: self.bucket_cap,
                sources,
            },
        ))
    }

    /// Run the aggregation. Buckets come back in store order.
    pub async fn aggregate(
        &self,
        index: &str,
        query: Predicate,
        dimensions: &[&str],
    ) -> AppResult<Vec<DimensionBucket>> {
        let request = self.build_request(query, dimensions)?;
        let response = self.store.search(index, &request, self.timeout).await?;

        let result = response.aggregation(AGGREGATION_NAME).ok_or_else(|| {
            StoreError::Decode(format!("response lacks '{AGGREGATION_NAME}' aggregation"))
        })?;
        let buckets = parse_buckets(result, dimensions)?;

        if buckets.len() >= self.bucket_cap {
            self.metrics.record_truncation();
            warn!(
                index,
                buckets = buckets.len(),
                cap = self.bucket_cap,
                "aggregation reached bucket cap; results truncated"
            );
        } else {
            debug!(index, buckets = buckets.len(), "aggregation complete");
        }

        Ok(buckets)
    }
}

/// Parse composite buckets into dimension tuples.
///
/// Every requested dimension appears in each tuple; scalar non-string
/// keys are stringified.
pub fn parse_buckets(
    result: &Value,
    dimensions: &[&str],
) -> Result<Vec<DimensionBucket>, StoreError> {
    let raw = result
        .get("buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Decode("aggregation result without buckets".to_string()))?;

    let mut buckets = Vec::with_capacity(raw.len());
    for entry in raw {
        let key = entry
            .get("key")
            .and_then(Value::as_object)
            .ok_or_else(|| StoreError::Decode("bucket without key".to_string()))?;
        let doc_count = entry
            .get("doc_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::Decode("bucket without doc_count".to_string()))?;

        let tuple: DimensionTuple = dimensions
            .iter()
            .map(|dim| {
                let value = match key.get(*dim) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => Some(other.to_string()),
                };
                (dim.to_string(), value)
            })
            .collect();

        buckets.push(DimensionBucket { tuple, doc_count });
    }
    Ok(buckets)
}
