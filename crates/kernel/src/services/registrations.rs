//! Registrations behind one aggregated place.
//!
//! A place id is replayed as a filter over every tuple rendering the same
//! label: in each alternative a non-empty dimension becomes an exact match
//! and a null or empty one becomes "missing or empty". Every raw bucket
//! that collapsed into the place then matches, so the replayed total
//! equals the collapsed count.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::aggregate::{DimensionTuple, LocationProfile, label_variants, place_key};
use crate::error::{AppError, AppResult};
use crate::models::{RecordType, RegistrationRecord};
use crate::pagination::{PageRequest, Pagination, TIEBREAKER_FIELD};
use crate::query::FilterSpec;
use crate::store::{DocumentStore, SearchRequest, SortClause, SortOrder, StoreError};

/// Parameters of a registrations-by-place listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRegistrationsQuery {
    pub record_type: RecordType,
    pub approved_only: bool,
    pub page: PageRequest,
}

/// One page of registrations.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationPage {
    pub registrations: Vec<RegistrationRecord>,
    pub pagination: Pagination,
}

pub struct RegistrationService {
    store: Arc<dyn DocumentStore>,
    index: String,
    timeout: Duration,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn DocumentStore>, index: impl Into<String>, timeout: Duration) -> Self {
        Self {
            store,
            index: index.into(),
            timeout,
        }
    }

    /// Decode a place id issued for `profile`.
    pub fn decode_place(profile: &LocationProfile, place_id: &str) -> AppResult<DimensionTuple> {
        let tuple = place_key::decode(place_id)?;
        if !profile.accepts(&tuple) {
            return Err(AppError::BadRequest(format!(
                "place id does not describe a {} location",
                profile.name
            )));
        }
        Ok(tuple)
    }

    /// Filter for the documents behind a place.
    pub fn place_filter(
        profile: &LocationProfile,
        tuple: &DimensionTuple,
        query: &PlaceRegistrationsQuery,
    ) -> FilterSpec {
        let places = label_variants(tuple, profile).into_iter().map(|variant| {
            variant
                .iter()
                .fold(FilterSpec::new(), |filter, (field, value)| match value.as_deref() {
                    Some(v) if !v.is_empty() => filter.equals(field, v),
                    _ => filter.blank(field),
                })
        });
        FilterSpec::new()
            .record_type(query.record_type)
            .approved_only(query.approved_only)
            .any_of(places)
    }

    pub async fn list(
        &self,
        profile: &LocationProfile,
        place_id: &str,
        query: &PlaceRegistrationsQuery,
    ) -> AppResult<RegistrationPage> {
        let tuple = Self::decode_place(profile, place_id)?;
        let predicate = Self::place_filter(profile, &tuple, query).build();

        let limit = u64::from(query.page.limit);
        let request = SearchRequest::hits(predicate, query.page.offset(), limit)
            .with_sort(vec![SortClause::new(TIEBREAKER_FIELD, SortOrder::Asc)])
            .with_total_hits();
        let response = self.store.search(&self.index, &request, self.timeout).await?;

        let total = response
            .total()
            .ok_or_else(|| StoreError::Decode("search response without hit total".to_string()))?;
        let registrations: Vec<RegistrationRecord> = response
            .hits
            .hits
            .into_iter()
            .map(RegistrationRecord::from)
            .collect();
        debug!(
            index = %self.index,
            total,
            returned = registrations.len(),
            "registrations for place"
        );

        Ok(RegistrationPage {
            registrations,
            pagination: query.page.describe(total),
        })
    }
}
