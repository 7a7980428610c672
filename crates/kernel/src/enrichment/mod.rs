//! Identity enrichment.
//!
//! Nationality is inconsistently captured: one document for a person may
//! carry it while another for the same national id carries nothing or a
//! placeholder. After a page of persons is read, one batched aggregation
//! ranks the nationality values recorded for each identity on the page,
//! and rows lacking a valid value take the best-ranked valid candidate.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::AppResult;
use crate::metrics::Metrics;
use crate::models::PersonRecord;
use crate::query::{Predicate, keyword};
use crate::store::{Aggregation, DocumentStore, SearchRequest, StoreError};

/// Field shared by every document describing one person.
pub const IDENTITY_FIELD: &str = "national_id";

/// Field being backfilled.
pub const ENRICHED_FIELD: &str = "nationality";

/// Placeholder values written by upstream sources in place of a value.
pub const SENTINELS: &[&str] = &["noResult"];

/// Candidates kept per identity.
const CANDIDATES_PER_IDENTITY: usize = 10;

const AGGREGATION_NAME: &str = "identities";
const CANDIDATES_NAME: &str = "candidates";

/// Whether a value is usable: present, not blank and not a sentinel.
pub fn is_valid_value(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(v)),
    }
}

/// Identity → candidate values, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentIndex {
    candidates: HashMap<String, Vec<String>>,
}

impl EnrichmentIndex {
    pub fn insert(&mut self, identity: impl Into<String>, ranked: Vec<String>) {
        self.candidates.insert(identity.into(), ranked);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// First valid candidate for an identity.
    pub fn resolve(&self, identity: &str) -> Option<&str> {
        self.candidates
            .get(identity)?
            .iter()
            .map(String::as_str)
            .find(|v| is_valid_value(Some(v)))
    }

    /// Parse the nested terms aggregation result.
    pub fn from_aggregation(result: &Value) -> Result<Self, StoreError> {
        let buckets = result
            .get("buckets")
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::Decode("identity aggregation without buckets".to_string()))?;

        let mut index = Self::default();
        for bucket in buckets {
            let Some(identity) = bucket.get("key").and_then(Value::as_str) else {
                continue;
            };
            let ranked = bucket
                .get(CANDIDATES_NAME)
                .and_then(|c| c.get("buckets"))
                .and_then(Value::as_array)
                .map(|candidates| {
                    candidates
                        .iter()
                        .filter_map(|c| c.get("key").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            index.insert(identity, ranked);
        }
        Ok(index)
    }
}

/// Identities on rows that need a backfill.
pub fn identities_needing_backfill(rows: &[PersonRecord]) -> Vec<String> {
    rows.iter()
        .filter(|row| !is_valid_value(row.nationality.as_deref()))
        .filter_map(|row| row.national_id.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Backfill rows in place from the index. Valid values are never
/// overwritten. Returns the number of rows changed.
pub fn apply(rows: &mut [PersonRecord], index: &EnrichmentIndex) -> usize {
    let mut changed = 0;
    for row in rows.iter_mut() {
        if is_valid_value(row.nationality.as_deref()) {
            continue;
        }
        let Some(identity) = row.national_id.as_deref().map(str::trim) else {
            continue;
        };
        if let Some(value) = index.resolve(identity) {
            row.nationality = Some(value.to_string());
            changed += 1;
        }
    }
    changed
}

/// Runs the batched candidate lookup for one page.
pub struct IdentityEnricher {
    store: Arc<dyn DocumentStore>,
    metrics: Arc<Metrics>,
    timeout: Duration,
}

impl IdentityEnricher {
    pub fn new(store: Arc<dyn DocumentStore>, metrics: Arc<Metrics>, timeout: Duration) -> Self {
        Self {
            store,
            metrics,
            timeout,
        }
    }

    /// One request for every identity on the page.
    pub fn build_request(identities: &[String]) -> SearchRequest {
        let query = Predicate::terms(keyword(IDENTITY_FIELD), identities.iter().cloned());
        SearchRequest::aggregation(
            query,
            AGGREGATION_NAME,
            Aggregation::Terms {
                field: keyword(IDENTITY_FIELD),
                size: identities.len(),
                aggregations: vec![(
                    CANDIDATES_NAME.to_string(),
                    Aggregation::Terms {
                        field: keyword(ENRICHED_FIELD),
                        size: CANDIDATES_PER_IDENTITY,
                        aggregations: Vec::new(),
                    },
                )],
            },
        )
    }

    /// Enrich a page in place. No request is made when every row already
    /// has a valid value.
    pub async fn enrich(&self, index: &str, rows: &mut [PersonRecord]) -> AppResult<usize> {
        let identities = identities_needing_backfill(rows);
        if identities.is_empty() {
            return Ok(0);
        }

        let request = Self::build_request(&identities);
        let response = self.store.search(index, &request, self.timeout).await?;
        let result = response.aggregation(AGGREGATION_NAME).ok_or_else(|| {
            StoreError::Decode(format!("response lacks '{AGGREGATION_NAME}' aggregation"))
        })?;
        let candidates = EnrichmentIndex::from_aggregation(result)?;

        let changed = apply(rows, &candidates);
        self.metrics.record_backfills(changed as u64);
        debug!(
            index,
            identities = identities.len(),
            backfilled = changed,
            "identity enrichment complete"
        );
        Ok(changed)
    }
}
