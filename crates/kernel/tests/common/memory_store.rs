//! In-memory document store.
//!
//! Evaluates the kernel's typed predicate tree, sort + search_after
//! paging, composite aggregations with missing buckets and nested terms
//! aggregations over JSON documents held per index. Every request is
//! recorded so tests can count round trips.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use sajili_kernel::query::{BoolQuery, Predicate};
use sajili_kernel::store::{
    Aggregation, CompositeSource, DocumentStore, Hit, Hits, SearchRequest, SearchResponse,
    SortClause, SortOrder, StoreError, TotalHits,
};

/// Injected store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Timeout,
    Unavailable,
}

/// One recorded store call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub index: String,
    pub body: Value,
}

#[derive(Default)]
pub struct InMemoryStore {
    indexes: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
    failure: Mutex<Option<Failure>>,
    down: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents to an index.
    pub fn insert(&self, index: &str, docs: impl IntoIterator<Item = Value>) {
        self.indexes
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .extend(docs);
    }

    /// Make every following search/count fail.
    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    /// Make ping report the cluster as unreachable.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, AtomicOrdering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, operation: &'static str, index: &str, body: Value) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(RecordedCall {
            operation,
            index: index.to_string(),
            body,
        });
        match *self.failure.lock().unwrap() {
            Some(Failure::Timeout) => Err(StoreError::Timeout),
            Some(Failure::Unavailable) => Err(StoreError::Status {
                status: 503,
                body: "no shards available".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn matching(&self, index: &str, query: &Predicate) -> Vec<Value> {
        self.indexes
            .lock()
            .unwrap()
            .get(index)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| evaluate(query, doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
        _timeout: Duration,
    ) -> Result<SearchResponse, StoreError> {
        self.record("search", index, request.to_wire())?;
        let docs = self.matching(index, &request.query);

        let aggregations = if request.aggregations.is_empty() {
            None
        } else {
            let mut results = Map::new();
            for (name, agg) in &request.aggregations {
                results.insert(name.clone(), aggregate(agg, &docs));
            }
            Some(Value::Object(results))
        };

        let total = docs.len() as u64;
        let hits = page_hits(docs, request);

        Ok(SearchResponse {
            timed_out: false,
            hits: Hits {
                total: Some(TotalHits {
                    value: total,
                    relation: "eq".to_string(),
                }),
                hits,
            },
            aggregations,
        })
    }

    async fn count(
        &self,
        index: &str,
        query: &Predicate,
        _timeout: Duration,
    ) -> Result<u64, StoreError> {
        self.record("count", index, json!({ "query": query.to_wire() }))?;
        Ok(self.matching(index, query).len() as u64)
    }

    async fn ping(&self) -> bool {
        !self.down.load(AtomicOrdering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Predicate evaluation
// ---------------------------------------------------------------------------

fn source_field(field: &str) -> &str {
    field.strip_suffix(".keyword").unwrap_or(field)
}

fn field_value<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    doc.get(source_field(field)).filter(|v| !v.is_null())
}

fn evaluate(predicate: &Predicate, doc: &Value) -> bool {
    match predicate {
        Predicate::MatchAll => true,
        Predicate::Term { field, value } => field_value(doc, field) == Some(value),
        Predicate::Terms { field, values } => {
            field_value(doc, field).is_some_and(|v| values.contains(v))
        }
        Predicate::Exists { field } => field_value(doc, field).is_some(),
        Predicate::Match {
            field,
            query,
            fuzzy,
            all_terms,
        } => {
            let Some(text) = field_value(doc, field).and_then(Value::as_str) else {
                return false;
            };
            let doc_tokens = tokens(text);
            let query_tokens = tokens(query);
            if query_tokens.is_empty() {
                return false;
            }
            let token_matches = |q: &String| {
                doc_tokens
                    .iter()
                    .any(|d| d == q || (*fuzzy && levenshtein(d, q) <= fuzziness(q)))
            };
            if *all_terms {
                query_tokens.iter().all(token_matches)
            } else {
                query_tokens.iter().any(token_matches)
            }
        }
        Predicate::MatchPhrase { field, query } => {
            let Some(text) = field_value(doc, field).and_then(Value::as_str) else {
                return false;
            };
            let doc_tokens = tokens(text);
            let phrase = tokens(query);
            !phrase.is_empty() && doc_tokens.windows(phrase.len()).any(|w| w == phrase.as_slice())
        }
        Predicate::Wildcard { field, pattern } => field_value(doc, field)
            .and_then(Value::as_str)
            .is_some_and(|v| wildcard_match(&pattern.to_lowercase(), &v.to_lowercase())),
        Predicate::Range { field, gte, lte } => field_value(doc, field)
            .and_then(Value::as_i64)
            .is_some_and(|n| gte.is_none_or(|g| n >= g) && lte.is_none_or(|l| n <= l)),
        Predicate::Bool(query) => evaluate_bool(query, doc),
    }
}

fn evaluate_bool(query: &BoolQuery, doc: &Value) -> bool {
    if !query.must.iter().all(|p| evaluate(p, doc)) {
        return false;
    }
    if query.must_not.iter().any(|p| evaluate(p, doc)) {
        return false;
    }
    if query.should.is_empty() {
        return true;
    }
    let required = query
        .minimum_should_match
        .map(|n| n as usize)
        .unwrap_or(usize::from(query.must.is_empty()));
    query.should.iter().filter(|p| evaluate(p, doc)).count() >= required
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Edit distance allowed by `fuzziness: AUTO`.
fn fuzziness(token: &str) -> usize {
    match token.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}

/// `*` and `?` glob with `\` escapes.
fn wildcard_match(pattern: &str, value: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Tok {
        Lit(char),
        Any,
        One,
    }
    let mut toks = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        toks.push(match c {
            '\\' => Tok::Lit(chars.next().unwrap_or('\\')),
            '*' => Tok::Any,
            '?' => Tok::One,
            other => Tok::Lit(other),
        });
    }
    let value: Vec<char> = value.chars().collect();

    // dp[j]: toks[..i] matches value[..j]
    let mut dp = vec![false; value.len() + 1];
    dp[0] = true;
    for tok in &toks {
        let mut next = vec![false; value.len() + 1];
        match tok {
            Tok::Any => {
                let mut seen = false;
                for j in 0..=value.len() {
                    seen |= dp[j];
                    next[j] = seen;
                }
            }
            Tok::One => {
                for j in 0..value.len() {
                    next[j + 1] = dp[j];
                }
            }
            Tok::Lit(c) => {
                for j in 0..value.len() {
                    next[j + 1] = dp[j] && value[j] == *c;
                }
            }
        }
        dp = next;
    }
    dp[value.len()]
}

// ---------------------------------------------------------------------------
// Sorting and paging
// ---------------------------------------------------------------------------

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&y.as_f64().unwrap_or_default())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Compare two sort tuples; missing values sort last in either direction.
fn compare_keys(a: &[Value], b: &[Value], sort: &[SortClause]) -> Ordering {
    for (i, clause) in sort.iter().enumerate() {
        let (x, y) = (&a[i], &b[i]);
        let ord = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare_present(x, y);
                match clause.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn sort_key(doc: &Value, sort: &[SortClause]) -> Vec<Value> {
    sort.iter()
        .map(|clause| field_value(doc, &clause.field).cloned().unwrap_or(Value::Null))
        .collect()
}

fn page_hits(docs: Vec<Value>, request: &SearchRequest) -> Vec<Hit> {
    if request.size == 0 {
        return Vec::new();
    }

    let mut keyed: Vec<(Vec<Value>, Value)> = docs
        .into_iter()
        .map(|doc| (sort_key(&doc, &request.sort), doc))
        .collect();
    keyed.sort_by(|a, b| compare_keys(&a.0, &b.0, &request.sort));

    let skip = match request.search_after {
        Some(ref after) => keyed
            .iter()
            .take_while(|(key, _)| compare_keys(key, after, &request.sort) != Ordering::Greater)
            .count(),
        None => request.from as usize,
    };

    keyed
        .into_iter()
        .skip(skip)
        .take(request.size as usize)
        .map(|(key, doc)| Hit {
            id: doc
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            source: doc,
            sort: if request.sort.is_empty() { Vec::new() } else { key },
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

fn aggregate(agg: &Aggregation, docs: &[Value]) -> Value {
    match agg {
        Aggregation::Composite { size, sources } => composite(*size, sources, docs),
        Aggregation::Terms {
            field,
            size,
            aggregations,
        } => terms(field, *size, aggregations, docs),
    }
}

/// Composite buckets in key order (missing first), one page of `size`.
fn composite(size: usize, sources: &[CompositeSource], docs: &[Value]) -> Value {
    let mut groups: BTreeMap<Vec<Option<String>>, u64> = BTreeMap::new();
    'docs: for doc in docs {
        let mut key = Vec::with_capacity(sources.len());
        for source in sources {
            match field_value(doc, &source.field) {
                Some(Value::String(s)) => key.push(Some(s.clone())),
                Some(other) => key.push(Some(other.to_string())),
                None if source.missing_bucket => key.push(None),
                None => continue 'docs,
            }
        }
        *groups.entry(key).or_default() += 1;
    }

    let buckets: Vec<Value> = groups
        .into_iter()
        .take(size)
        .map(|(key, doc_count)| {
            let key: Map<String, Value> = sources
                .iter()
                .zip(key)
                .map(|(source, value)| (source.name.clone(), value.map_or(Value::Null, Value::String)))
                .collect();
            json!({ "key": key, "doc_count": doc_count })
        })
        .collect();

    let mut result = json!({ "buckets": buckets });
    if buckets_full(&result, size)
        && let Some(last) = result["buckets"].as_array().and_then(|b| b.last()).cloned()
    {
        result["after_key"] = last["key"].clone();
    }
    result
}

fn buckets_full(result: &Value, size: usize) -> bool {
    result["buckets"].as_array().is_some_and(|b| b.len() >= size)
}

/// Terms buckets ranked by doc count, then key.
fn terms(
    field: &str,
    size: usize,
    aggregations: &[(String, Aggregation)],
    docs: &[Value],
) -> Value {
    let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for doc in docs {
        if let Some(Value::String(s)) = field_value(doc, field) {
            groups.entry(s.clone()).or_default().push(doc.clone());
        }
    }

    let mut ranked: Vec<(String, Vec<Value>)> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));

    let buckets: Vec<Value> = ranked
        .into_iter()
        .take(size)
        .map(|(key, members)| {
            let mut bucket = json!({ "key": key, "doc_count": members.len() });
            for (name, sub) in aggregations {
                bucket[name.as_str()] = aggregate(sub, &members);
            }
            bucket
        })
        .collect();

    json!({ "buckets": buckets })
}
