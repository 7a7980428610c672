//! Primary person listing.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::enrichment::IdentityEnricher;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::models::{PersonRecord, RecordType};
use crate::pagination::{KeysetPlan, PageRequest, Pagination};
use crate::query::{FilterSpec, MatchMode, TextMatch, keyword};
use crate::store::{DocumentStore, SortClause, SortOrder, StoreError};

/// Text fields searched by the free-text term.
pub const PERSON_SEARCH_FIELDS: &[&str] = &["full_name"];

/// Sortable person fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonSortField {
    #[default]
    FullName,
    RegisteredAt,
    Age,
}

impl PersonSortField {
    /// Document field sorted on.
    pub fn field(&self) -> String {
        match self {
            PersonSortField::FullName => keyword("full_name"),
            PersonSortField::RegisteredAt => "registered_at".to_string(),
            PersonSortField::Age => "age".to_string(),
        }
    }
}

/// Parameters of a person listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonQuery {
    pub record_type: Option<RecordType>,
    pub search: Option<String>,
    pub match_mode: MatchMode,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub role: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub approved_only: bool,
    pub sort: PersonSortField,
    pub order: SortOrder,
    pub page: PageRequest,
    pub cursor: Option<String>,
}

/// One page of persons.
#[derive(Debug, Clone, Serialize)]
pub struct PersonPage {
    pub persons: Vec<PersonRecord>,
    pub pagination: Pagination,
}

pub struct PersonService {
    store: Arc<dyn DocumentStore>,
    enricher: IdentityEnricher,
    metrics: Arc<Metrics>,
    index: String,
    timeout: Duration,
}

impl PersonService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        metrics: Arc<Metrics>,
        index: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            enricher: IdentityEnricher::new(store.clone(), metrics.clone(), timeout),
            store,
            metrics,
            index: index.into(),
            timeout,
        }
    }

    /// Filter for a listing.
    pub fn filter(query: &PersonQuery) -> AppResult<FilterSpec> {
        if let (Some(min), Some(max)) = (query.min_age, query.max_age)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_age must not exceed max_age".to_string(),
            ));
        }

        let mut filter = FilterSpec::new();
        if let Some(record_type) = query.record_type {
            filter = filter.record_type(record_type);
        }
        let text = query.search.as_deref().and_then(|term| {
            TextMatch::new(term, query.match_mode, PERSON_SEARCH_FIELDS.iter().copied())
        });

        Ok(filter
            .approved_only(query.approved_only)
            .equals_opt("nationality", query.nationality.as_deref())
            .equals_opt("gender", query.gender.as_deref())
            .equals_opt("role", query.role.as_deref())
            .equals_opt("region", query.region.as_deref())
            .equals_opt("district", query.district.as_deref())
            .equals_opt("ward", query.ward.as_deref())
            .range("age", query.min_age, query.max_age)
            .text(text))
    }

    /// Read one page, count the full result set alongside it, then
    /// backfill nationality from sibling records.
    pub async fn list(&self, query: &PersonQuery) -> AppResult<PersonPage> {
        let predicate = Self::filter(query)?.build();
        let plan = KeysetPlan::resolve(
            vec![SortClause::new(query.sort.field(), query.order)],
            query.page,
            query.cursor.as_deref(),
            &self.metrics,
        );
        let request = plan.request(predicate.clone());

        let (response, total) = tokio::try_join!(
            self.store.search(&self.index, &request, self.timeout),
            self.store.count(&self.index, &predicate, self.timeout),
        )?;

        let mut pagination = query.page.describe(total);
        pagination.next_cursor = plan.next_cursor(&response.hits.hits, pagination.has_more);

        let mut persons = response
            .hits
            .hits
            .into_iter()
            .map(PersonRecord::from_hit)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Decode(format!("person document: {e}")))?;

        let backfilled = self.enricher.enrich(&self.index, &mut persons).await?;
        debug!(
            index = %self.index,
            total,
            returned = persons.len(),
            cursor = plan.uses_cursor(),
            backfilled,
            "person listing"
        );

        Ok(PersonPage {
            persons,
            pagination,
        })
    }
}
