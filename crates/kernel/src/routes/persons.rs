//! Person listing route handler.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::locations::query_params;
use crate::error::AppResult;
use crate::models::{PersonRecord, RecordType};
use crate::pagination::{PageRequest, Pagination};
use crate::query::MatchMode;
use crate::services::{PersonQuery, PersonSortField};
use crate::state::AppState;
use crate::store::SortOrder;

/// Create the person router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/persons", get(list_persons))
}

/// Person listing query parameters.
#[derive(Debug, Deserialize)]
pub struct PersonParams {
    pub record_type: RecordType,
    pub search: Option<String>,
    #[serde(default)]
    pub whole_word: bool,
    #[serde(default)]
    pub whole_sentence: bool,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub role: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    #[serde(default)]
    pub approved_only: bool,
    #[serde(default)]
    pub sort: PersonSortField,
    #[serde(default)]
    pub order: SortOrder,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl From<PersonParams> for PersonQuery {
    fn from(params: PersonParams) -> Self {
        Self {
            record_type: Some(params.record_type),
            search: params.search,
            match_mode: MatchMode::from_flags(params.whole_word, params.whole_sentence),
            nationality: params.nationality,
            gender: params.gender,
            role: params.role,
            region: params.region,
            district: params.district,
            ward: params.ward,
            min_age: params.min_age,
            max_age: params.max_age,
            approved_only: params.approved_only,
            sort: params.sort,
            order: params.order,
            page: PageRequest::new(params.page, params.limit),
            cursor: params.cursor.filter(|c| !c.trim().is_empty()),
        }
    }
}

/// Person listing response.
#[derive(Debug, Serialize)]
pub struct PersonsResponse {
    pub success: bool,
    pub persons: Vec<PersonRecord>,
    pub pagination: Pagination,
}

async fn list_persons(
    State(state): State<AppState>,
    params: Result<Query<PersonParams>, QueryRejection>,
) -> AppResult<Json<PersonsResponse>> {
    let query = PersonQuery::from(query_params(params)?);
    let page = state.persons().list(&query).await?;

    Ok(Json(PersonsResponse {
        success: true,
        persons: page.persons,
        pagination: page.pagination,
    }))
}
