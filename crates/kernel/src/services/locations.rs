//! Aggregated location listings.

use serde::Serialize;
use tracing::debug;

use super::IndexNames;
use crate::aggregate::{BucketAggregator, LocationProfile, PlaceRecord, collapse};
use crate::error::AppResult;
use crate::models::RecordType;
use crate::pagination::{PageRequest, Pagination, paginate};
use crate::query::{FilterSpec, MatchMode, TextMatch};

/// Parameters of one location listing.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub record_type: RecordType,
    pub search: Option<String>,
    pub approved_only: bool,
    pub page: PageRequest,
}

/// One page of places.
#[derive(Debug, Clone, Serialize)]
pub struct PlacePage {
    pub locations: Vec<PlaceRecord>,
    pub pagination: Pagination,
}

/// Aggregates location dimensions into paged place records.
pub struct LocationService {
    aggregator: BucketAggregator,
    indexes: IndexNames,
}

impl LocationService {
    pub fn new(aggregator: BucketAggregator, indexes: IndexNames) -> Self {
        Self {
            aggregator,
            indexes,
        }
    }

    /// Filter for a listing: record type, approval, at least one place
    /// dimension present, and the free-text term over the search fields.
    pub fn filter(profile: &LocationProfile, query: &LocationQuery) -> FilterSpec {
        let text = query.search.as_deref().and_then(|term| {
            TextMatch::new(term, MatchMode::Fuzzy, profile.search_fields.iter().copied())
        });

        FilterSpec::new()
            .record_type(query.record_type)
            .approved_only(query.approved_only)
            .any_present(profile.place_fields)
            .text(text)
    }

    pub async fn list(
        &self,
        profile: &LocationProfile,
        query: &LocationQuery,
    ) -> AppResult<PlacePage> {
        let index = self.indexes.resolve(profile.index);
        let predicate = Self::filter(profile, query).build();

        let buckets = self
            .aggregator
            .aggregate(index, predicate, &profile.dimensions())
            .await?;
        let raw = buckets.len();
        let places = collapse(buckets, profile)?;
        debug!(
            profile = profile.name,
            index,
            buckets = raw,
            places = places.len(),
            "collapsed location buckets"
        );

        let (locations, pagination) = paginate(places, query.page);
        Ok(PlacePage {
            locations,
            pagination,
        })
    }
}
