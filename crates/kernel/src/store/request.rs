//! Typed search request.
//!
//! Everything stays typed until [`SearchRequest::to_wire`] renders the
//! store's JSON body.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::query::Predicate;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl SortClause {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    fn to_wire(&self) -> Value {
        json!({ &self.field: { "order": self.order.as_str(), "missing": "_last" } })
    }
}

/// One source of a composite aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSource {
    /// Key name in the bucket tuple.
    pub name: String,
    /// Keyword field grouped on.
    pub field: String,
    /// Emit a `null` bucket for documents without the field.
    pub missing_bucket: bool,
}

/// Aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Grouped count over several keyword fields in one pass.
    Composite {
        size: usize,
        sources: Vec<CompositeSource>,
    },
    /// Top values of one field ranked by document count, with optional
    /// nested aggregations per bucket.
    Terms {
        field: String,
        size: usize,
        aggregations: Vec<(String, Aggregation)>,
    },
}

impl Aggregation {
    fn to_wire(&self) -> Value {
        match self {
            Aggregation::Composite { size, sources } => {
                let sources: Vec<Value> = sources
                    .iter()
                    .map(|s| {
                        json!({ &s.name: { "terms": {
                            "field": s.field,
                            "missing_bucket": s.missing_bucket
                        } } })
                    })
                    .collect();
                json!({ "composite": { "size": size, "sources": sources } })
            }
            Aggregation::Terms {
                field,
                size,
                aggregations,
            } => {
                let mut body = json!({ "terms": { "field": field, "size": size } });
                if !aggregations.is_empty()
                    && let Some(obj) = body.as_object_mut()
                {
                    obj.insert("aggs".to_string(), named_aggregations(aggregations));
                }
                body
            }
        }
    }
}

fn named_aggregations(aggregations: &[(String, Aggregation)]) -> Value {
    let mut map = Map::new();
    for (name, agg) in aggregations {
        map.insert(name.clone(), agg.to_wire());
    }
    Value::Object(map)
}

/// Search request against one index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Predicate,
    pub from: u64,
    pub size: u64,
    pub sort: Vec<SortClause>,
    pub search_after: Option<Vec<Value>>,
    pub aggregations: Vec<(String, Aggregation)>,
    pub track_total_hits: bool,
}

impl SearchRequest {
    /// Hits-only request for one page.
    pub fn hits(query: Predicate, from: u64, size: u64) -> Self {
        Self {
            query,
            from,
            size,
            sort: Vec::new(),
            search_after: None,
            aggregations: Vec::new(),
            track_total_hits: false,
        }
    }

    /// Aggregation-only request (no hits returned).
    pub fn aggregation(query: Predicate, name: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            aggregations: vec![(name.into(), aggregation)],
            ..Self::hits(query, 0, 0)
        }
    }

    pub fn with_sort(mut self, sort: Vec<SortClause>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_search_after(mut self, search_after: Option<Vec<Value>>) -> Self {
        self.search_after = search_after;
        self
    }

    pub fn with_total_hits(mut self) -> Self {
        self.track_total_hits = true;
        self
    }

    /// Render the JSON request body.
    pub fn to_wire(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query.to_wire());
        body.insert("size".to_string(), json!(self.size));
        // search_after and from are mutually exclusive on the store side.
        if self.search_after.is_none() && self.from > 0 {
            body.insert("from".to_string(), json!(self.from));
        }
        if !self.sort.is_empty() {
            body.insert(
                "sort".to_string(),
                Value::Array(self.sort.iter().map(SortClause::to_wire).collect()),
            );
        }
        if let Some(ref after) = self.search_after {
            body.insert("search_after".to_string(), Value::Array(after.clone()));
        }
        if !self.aggregations.is_empty() {
            body.insert("aggs".to_string(), named_aggregations(&self.aggregations));
        }
        body.insert(
            "track_total_hits".to_string(),
            json!(self.track_total_hits),
        );
        Value::Object(body)
    }
}
