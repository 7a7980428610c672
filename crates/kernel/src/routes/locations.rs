//! Aggregated location route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    BUSINESS_LOCATIONS, LocationProfile, PERSON_IDENTITY_LOCATIONS, PERSON_REPORTED_LOCATIONS,
    PlaceRecord,
};
use crate::error::{AppError, AppResult};
use crate::models::{RecordType, RegistrationRecord};
use crate::pagination::{PageRequest, Pagination};
use crate::services::{LocationQuery, PlaceRegistrationsQuery};
use crate::state::AppState;

/// Create the location router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/business/locations", get(business_locations))
        .route(
            "/api/business/locations/{place_id}/registrations",
            get(place_registrations),
        )
        .route("/api/persons/locations/identity", get(identity_locations))
        .route("/api/persons/locations/reported", get(reported_locations))
}

/// Location listing query parameters.
#[derive(Debug, Deserialize)]
pub struct LocationParams {
    pub record_type: RecordType,
    pub search: Option<String>,
    #[serde(default)]
    pub approved_only: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<LocationParams> for LocationQuery {
    fn from(params: LocationParams) -> Self {
        Self {
            record_type: params.record_type,
            search: params.search,
            approved_only: params.approved_only,
            page: PageRequest::new(params.page, params.limit),
        }
    }
}

/// Registrations-by-place query parameters.
#[derive(Debug, Deserialize)]
pub struct PlaceRegistrationsParams {
    pub record_type: RecordType,
    #[serde(default)]
    pub approved_only: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Location listing response.
#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub success: bool,
    pub locations: Vec<PlaceRecord>,
    pub pagination: Pagination,
}

/// Registrations-by-place response.
#[derive(Debug, Serialize)]
pub struct RegistrationsResponse {
    pub success: bool,
    pub registrations: Vec<RegistrationRecord>,
    pub pagination: Pagination,
}

/// Unwrap query parameters, reporting bad input in the failure envelope.
pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    params
        .map(|Query(p)| p)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn list_locations(
    state: &AppState,
    profile: &LocationProfile,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> AppResult<Json<LocationsResponse>> {
    let query = LocationQuery::from(query_params(params)?);
    let page = state.locations().list(profile, &query).await?;

    Ok(Json(LocationsResponse {
        success: true,
        locations: page.locations,
        pagination: page.pagination,
    }))
}

async fn business_locations(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> AppResult<Json<LocationsResponse>> {
    list_locations(&state, &BUSINESS_LOCATIONS, params).await
}

async fn identity_locations(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> AppResult<Json<LocationsResponse>> {
    list_locations(&state, &PERSON_IDENTITY_LOCATIONS, params).await
}

async fn reported_locations(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> AppResult<Json<LocationsResponse>> {
    list_locations(&state, &PERSON_REPORTED_LOCATIONS, params).await
}

/// Registrations behind one business place id.
async fn place_registrations(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
    params: Result<Query<PlaceRegistrationsParams>, QueryRejection>,
) -> AppResult<Json<RegistrationsResponse>> {
    let params = query_params(params)?;
    let query = PlaceRegistrationsQuery {
        record_type: params.record_type,
        approved_only: params.approved_only,
        page: PageRequest::new(params.page, params.limit),
    };

    let page = state
        .registrations()
        .list(&BUSINESS_LOCATIONS, &place_id, &query)
        .await?;

    Ok(Json(RegistrationsResponse {
        success: true,
        registrations: page.registrations,
        pagination: page.pagination,
    }))
}
