//! Search response shapes.

use serde::Deserialize;
use serde_json::Value;

/// Search response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Set by the store when the query hit its own time budget and the
    /// result is partial.
    #[serde(default)]
    pub timed_out: bool,

    #[serde(default)]
    pub hits: Hits,

    /// Named aggregation results, left untyped until a consumer parses
    /// the shape it asked for.
    #[serde(default)]
    pub aggregations: Option<Value>,
}

impl SearchResponse {
    /// Total hit count, when the request tracked it.
    pub fn total(&self) -> Option<u64> {
        self.hits.total.as_ref().map(|t| t.value)
    }

    /// Result of one named aggregation.
    pub fn aggregation(&self, name: &str) -> Option<&Value> {
        self.aggregations.as_ref().and_then(|aggs| aggs.get(name))
    }
}

/// Hits section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: Option<TotalHits>,

    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Total hit count.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalHits {
    pub value: u64,

    /// `eq` or `gte` (lower bound).
    #[serde(default)]
    pub relation: String,
}

/// One matching document.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_source", default)]
    pub source: Value,

    /// Sort values of this hit, present when the request sorted.
    #[serde(default)]
    pub sort: Vec<Value>,
}
