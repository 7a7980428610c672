//! Document store access.
//!
//! The search index is an external collaborator reached over its REST
//! API. Components never talk to it directly: they receive a scoped
//! `Arc<dyn DocumentStore>` handle whose lifecycle is owned by the
//! process entry point.

mod http;
mod request;
mod response;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::query::Predicate;

pub use http::HttpDocumentStore;
pub use request::{Aggregation, CompositeSource, SearchRequest, SortClause, SortOrder};
pub use response::{Hit, Hits, SearchResponse, TotalHits};

/// Store access errors. All of them are fatal to the request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("search store timed out")]
    Timeout,

    #[error("search store unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("search store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed search store response: {0}")]
    Decode(String),

    #[error("invalid search store request: {0}")]
    Request(String),
}

/// Read-only document store interface.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a search (hits and/or aggregations) against one index.
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
        timeout: Duration,
    ) -> Result<SearchResponse, StoreError>;

    /// Count documents matching a filter-only query.
    async fn count(
        &self,
        index: &str,
        query: &Predicate,
        timeout: Duration,
    ) -> Result<u64, StoreError>;

    /// Whether the store answers at all.
    async fn ping(&self) -> bool;
}
