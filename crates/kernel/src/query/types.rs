//! Predicate tree types.
//!
//! Provides the typed query representation handed to the document store:
//! - Predicate: leaf matchers plus the boolean compound node
//! - BoolQuery: must / should / must_not with minimum_should_match
//! - MatchMode: how a free-text term is matched

use serde::Deserialize;
use serde_json::{Map, Value, json};

/// A node in the boolean predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every document.
    MatchAll,
    /// Exact value on a keyword (or scalar) field.
    Term { field: String, value: Value },
    /// Exact value in a set.
    Terms { field: String, values: Vec<Value> },
    /// Analyzed match on a text field.
    Match {
        field: String,
        query: String,
        /// Allow edit-distance matching on each token.
        fuzzy: bool,
        /// Every token must match (`operator: and`).
        all_terms: bool,
    },
    /// Tokens must appear in order, adjacent.
    MatchPhrase { field: String, query: String },
    /// Case-insensitive pattern on a keyword field (`*` and `?` wildcards).
    Wildcard { field: String, pattern: String },
    /// Inclusive numeric range; either bound may be open.
    Range {
        field: String,
        gte: Option<i64>,
        lte: Option<i64>,
    },
    /// Field is present and non-null.
    Exists { field: String },
    /// Boolean compound.
    Bool(BoolQuery),
}

impl Predicate {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Predicate::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Predicate::Exists {
            field: field.into(),
        }
    }

    /// Whether the node matches everything.
    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::MatchAll)
    }

    /// Serialize to the store's query DSL.
    pub fn to_wire(&self) -> Value {
        match self {
            Predicate::MatchAll => json!({ "match_all": {} }),
            Predicate::Term { field, value } => json!({ "term": { field: { "value": value } } }),
            Predicate::Terms { field, values } => json!({ "terms": { field: values } }),
            Predicate::Match {
                field,
                query,
                fuzzy,
                all_terms,
            } => {
                let mut options = Map::new();
                options.insert("query".to_string(), json!(query));
                options.insert(
                    "operator".to_string(),
                    json!(if *all_terms { "and" } else { "or" }),
                );
                if *fuzzy {
                    options.insert("fuzziness".to_string(), json!("AUTO"));
                }
                json!({ "match": { field: options } })
            }
            Predicate::MatchPhrase { field, query } => {
                json!({ "match_phrase": { field: { "query": query } } })
            }
            Predicate::Wildcard { field, pattern } => json!({
                "wildcard": { field: { "value": pattern, "case_insensitive": true } }
            }),
            Predicate::Range { field, gte, lte } => {
                let mut bounds = Map::new();
                if let Some(gte) = gte {
                    bounds.insert("gte".to_string(), json!(gte));
                }
                if let Some(lte) = lte {
                    bounds.insert("lte".to_string(), json!(lte));
                }
                json!({ "range": { field: bounds } })
            }
            Predicate::Exists { field } => json!({ "exists": { "field": field } }),
            Predicate::Bool(query) => query.to_wire(),
        }
    }
}

/// Boolean compound node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Predicate>,
    pub should: Vec<Predicate>,
    pub must_not: Vec<Predicate>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, predicate: Predicate) -> Self {
        self.must.push(predicate);
        self
    }

    pub fn should(mut self, predicate: Predicate) -> Self {
        self.should.push(predicate);
        self
    }

    pub fn must_not(mut self, predicate: Predicate) -> Self {
        self.must_not.push(predicate);
        self
    }

    pub fn minimum_should_match(mut self, n: u32) -> Self {
        self.minimum_should_match = Some(n);
        self
    }

    /// "At least one of" group over the given predicates.
    pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            should: predicates.into_iter().collect(),
            minimum_should_match: Some(1),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    /// Collapse into a predicate; an empty compound is match-all.
    pub fn into_predicate(self) -> Predicate {
        if self.is_empty() {
            Predicate::MatchAll
        } else {
            Predicate::Bool(self)
        }
    }

    fn to_wire(&self) -> Value {
        let mut body = Map::new();
        let clauses = |items: &[Predicate]| -> Value {
            Value::Array(items.iter().map(Predicate::to_wire).collect())
        };
        if !self.must.is_empty() {
            body.insert("must".to_string(), clauses(&self.must));
        }
        if !self.should.is_empty() {
            body.insert("should".to_string(), clauses(&self.should));
        }
        if !self.must_not.is_empty() {
            body.insert("must_not".to_string(), clauses(&self.must_not));
        }
        if let Some(n) = self.minimum_should_match {
            body.insert("minimum_should_match".to_string(), json!(n));
        }
        json!({ "bool": body })
    }
}

/// Free-text matching strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Substring or fuzzy token match.
    #[default]
    Fuzzy,
    /// Every word must match exactly.
    WholeWord,
    /// The whole phrase must match in order.
    WholeSentence,
}

impl MatchMode {
    /// Resolve from request flags; whole-sentence wins over whole-word.
    pub fn from_flags(whole_word: bool, whole_sentence: bool) -> Self {
        if whole_sentence {
            MatchMode::WholeSentence
        } else if whole_word {
            MatchMode::WholeWord
        } else {
            MatchMode::Fuzzy
        }
    }
}
