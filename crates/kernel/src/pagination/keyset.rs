//! Keyset (search-after) pagination.
//!
//! A cursor is the sort values of the last row of the previous page, a
//! JSON array encoded as URL-safe base64 without padding. The sort always
//! ends with the unique id so that the cursor identifies one position.
//!
//! The cursor is only honored for page > 1. A cursor that fails to decode
//! is treated as absent and the page is read by offset instead.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::PageRequest;
use crate::metrics::Metrics;
use crate::query::Predicate;
use crate::store::{Hit, SearchRequest, SortClause, SortOrder};

/// Unique field that ends every keyset sort.
pub const TIEBREAKER_FIELD: &str = "id";

/// Longest cursor accepted.
const MAX_CURSOR_LEN: usize = 2048;

/// Cursor decoding errors. These never reach the client.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is empty")]
    Empty,

    #[error("cursor is too long")]
    TooLong,

    #[error("cursor is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cursor is not a sort tuple: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("cursor has {got} sort values, expected {expected}")]
    Arity { expected: usize, got: usize },
}

/// Sort values of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor(pub Vec<Value>);

impl Cursor {
    pub fn encode(&self) -> Result<String, CursorError> {
        let json = serde_json::to_vec(&self.0)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CursorError::Empty);
        }
        if token.len() > MAX_CURSOR_LEN {
            return Err(CursorError::TooLong);
        }
        let bytes = URL_SAFE_NO_PAD.decode(token)?;
        Ok(Cursor(serde_json::from_slice(&bytes)?))
    }
}

/// Append the id tiebreaker unless the sort already ends on it.
pub fn with_tiebreaker(mut sort: Vec<SortClause>) -> Vec<SortClause> {
    if sort.last().is_none_or(|clause| clause.field != TIEBREAKER_FIELD) {
        sort.push(SortClause::new(TIEBREAKER_FIELD, SortOrder::Asc));
    }
    sort
}

/// How one page will be read.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetPlan {
    pub sort: Vec<SortClause>,
    pub page: PageRequest,
    /// Sort values to continue after; `None` reads by offset.
    pub search_after: Option<Vec<Value>>,
}

impl KeysetPlan {
    /// Decide between search-after and offset for this page.
    pub fn resolve(
        sort: Vec<SortClause>,
        page: PageRequest,
        cursor: Option<&str>,
        metrics: &Metrics,
    ) -> Self {
        let sort = with_tiebreaker(sort);
        let search_after = match cursor {
            Some(token) if page.page > 1 => match Self::decode_for(token, sort.len()) {
                Ok(values) => Some(values),
                Err(e) => {
                    metrics.record_cursor_fallback();
                    debug!(reason = %e, page = page.page, "cursor rejected; reading by offset");
                    None
                }
            },
            _ => None,
        };

        Self {
            sort,
            page,
            search_after,
        }
    }

    fn decode_for(token: &str, arity: usize) -> Result<Vec<Value>, CursorError> {
        let Cursor(values) = Cursor::decode(token)?;
        if values.len() != arity {
            return Err(CursorError::Arity {
                expected: arity,
                got: values.len(),
            });
        }
        Ok(values)
    }

    pub fn uses_cursor(&self) -> bool {
        self.search_after.is_some()
    }

    /// Search request for this page.
    pub fn request(&self, query: Predicate) -> SearchRequest {
        let from = if self.uses_cursor() {
            0
        } else {
            self.page.offset()
        };
        SearchRequest::hits(query, from, u64::from(self.page.limit))
            .with_sort(self.sort.clone())
            .with_search_after(self.search_after.clone())
    }

    /// Cursor for the page after this one, taken from the last hit.
    pub fn next_cursor(&self, hits: &[Hit], has_more: bool) -> Option<String> {
        if !has_more {
            return None;
        }
        let last = hits.last()?;
        if last.sort.len() != self.sort.len() {
            return None;
        }
        Cursor(last.sort.clone()).encode().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name_sort() -> Vec<SortClause> {
        vec![SortClause::new("full_name.keyword", SortOrder::Asc)]
    }

    fn token(values: Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&values).unwrap())
    }

    #[test]
    fn tiebreaker_is_appended_once() {
        let sort = with_tiebreaker(name_sort());
        assert_eq!(sort.len(), 2);
        assert_eq!(sort[1].field, TIEBREAKER_FIELD);
        assert_eq!(with_tiebreaker(sort.clone()), sort);
    }

    #[test]
    fn cursor_round_trips() {
        let cursor = Cursor(vec![json!("Zawadi"), json!(null), json!("p-7")]);
        assert_eq!(Cursor::decode(&cursor.encode().unwrap()).unwrap(), cursor);
    }

    #[test]
    fn cursor_is_used_after_the_first_page() {
        let metrics = Metrics::new();
        let plan = KeysetPlan::resolve(
            name_sort(),
            PageRequest::new(Some(2), Some(10)),
            Some(&token(json!(["Baraka", "p-3"]))),
            &metrics,
        );

        assert_eq!(plan.search_after, Some(vec![json!("Baraka"), json!("p-3")]));
        let wire = plan.request(Predicate::MatchAll).to_wire();
        assert!(wire.get("from").is_none());
        assert_eq!(wire["search_after"], json!(["Baraka", "p-3"]));
    }

    #[test]
    fn cursor_on_first_page_is_ignored() {
        let metrics = Metrics::new();
        let plan = KeysetPlan::resolve(
            name_sort(),
            PageRequest::new(Some(1), Some(10)),
            Some(&token(json!(["Baraka", "p-3"]))),
            &metrics,
        );
        assert!(!plan.uses_cursor());
        assert!(metrics.encode().contains("cursor_fallbacks_total 0"));
    }

    #[test]
    fn malformed_cursor_falls_back_to_offset() {
        let metrics = Metrics::new();
        let page = PageRequest::new(Some(3), Some(10));

        for bad in ["%%%".to_string(), token(json!({"a": 1})), token(json!(["only-one"]))] {
            let plan = KeysetPlan::resolve(name_sort(), page, Some(&bad), &metrics);
            assert!(!plan.uses_cursor(), "{bad}");
            assert_eq!(plan.request(Predicate::MatchAll).to_wire()["from"], json!(20));
        }
        assert!(metrics.encode().contains("cursor_fallbacks_total 3"));
    }

    #[test]
    fn next_cursor_comes_from_last_hit() {
        let metrics = Metrics::new();
        let plan = KeysetPlan::resolve(name_sort(), PageRequest::default(), None, &metrics);
        let hits = vec![
            Hit {
                id: "p-1".to_string(),
                source: json!({}),
                sort: vec![json!("Asha"), json!("p-1")],
            },
            Hit {
                id: "p-2".to_string(),
                source: json!({}),
                sort: vec![json!("Baraka"), json!("p-2")],
            },
        ];

        let next = plan.next_cursor(&hits, true).unwrap();
        assert_eq!(Cursor::decode(&next).unwrap().0, vec![json!("Baraka"), json!("p-2")]);
        assert_eq!(plan.next_cursor(&hits, false), None);
        assert_eq!(plan.next_cursor(&[], true), None);
    }
}
