//! Pagination.
//!
//! Two strategies share one request/response shape:
//! - offset: slices an in-memory, already sorted aggregate list
//! - keyset: search-after over raw result sets, with an offset fallback

pub mod keyset;
mod offset;

use serde::Serialize;

pub use keyset::{Cursor, CursorError, KeysetPlan, TIEBREAKER_FIELD};
pub use offset::paginate;

/// Largest page size a client may ask for.
pub const MAX_LIMIT: u32 = 100;

/// Page size when the client asks for none.
pub const DEFAULT_LIMIT: u32 = 25;

/// Validated page coordinates. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp client input into range: page ≥ 1, limit in `1..=MAX_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Pagination block for a known total.
    pub fn describe(&self, total_count: u64) -> Pagination {
        let total_pages = total_count.div_ceil(u64::from(self.limit));
        Pagination {
            page: self.page,
            limit: self.limit,
            total_count,
            total_pages,
            has_more: u64::from(self.page) < total_pages,
            next_cursor: None,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination block of a listing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
