//! Filter compilation.
//!
//! Turns typed request parameters into one boolean predicate:
//! - AND-ed equality filters on keyword fields
//! - "missing or empty" groups for replayed null dimensions
//! - an OR-group requiring at least one aggregation dimension
//! - an OR-group of alternative sub-filters
//! - a free-text clause honoring the selected match mode

use super::keyword;
use super::types::{BoolQuery, MatchMode, Predicate};
use super::{APPROVAL_FIELD, APPROVED, RECORD_TYPE_FIELD};
use crate::models::RecordType;

/// Free-text search over one or more text fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    term: String,
    mode: MatchMode,
    fields: Vec<String>,
}

impl TextMatch {
    /// Create a text match; returns `None` when the term is blank or no
    /// field is given.
    pub fn new<S: Into<String>>(
        term: &str,
        mode: MatchMode,
        fields: impl IntoIterator<Item = S>,
    ) -> Option<Self> {
        let term = term.trim();
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if term.is_empty() || fields.is_empty() {
            return None;
        }
        Some(Self {
            term: term.to_string(),
            mode,
            fields,
        })
    }

    fn to_predicate(&self) -> Predicate {
        let mut clauses = Vec::with_capacity(self.fields.len() * 2);
        for field in &self.fields {
            match self.mode {
                MatchMode::Fuzzy => {
                    clauses.push(Predicate::Match {
                        field: field.clone(),
                        query: self.term.clone(),
                        fuzzy: true,
                        all_terms: false,
                    });
                    clauses.push(Predicate::Wildcard {
                        field: keyword(field),
                        pattern: format!("*{}*", escape_wildcards(&self.term)),
                    });
                }
                MatchMode::WholeWord => clauses.push(Predicate::Match {
                    field: field.clone(),
                    query: self.term.clone(),
                    fuzzy: false,
                    all_terms: true,
                }),
                MatchMode::WholeSentence => clauses.push(Predicate::MatchPhrase {
                    field: field.clone(),
                    query: self.term.clone(),
                }),
            }
        }
        BoolQuery::any_of(clauses).into_predicate()
    }
}

/// Immutable per-request filter description.
///
/// Built with consuming setters, compiled once with [`FilterSpec::build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    equals: Vec<(String, String)>,
    blank: Vec<String>,
    ranges: Vec<(String, Option<i64>, Option<i64>)>,
    any_present: Vec<String>,
    alternatives: Vec<FilterSpec>,
    text: Option<TextMatch>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one record type.
    pub fn record_type(self, record_type: RecordType) -> Self {
        self.equals(RECORD_TYPE_FIELD, record_type.as_str())
    }

    /// Restrict to approved registrations when `approved_only` is set.
    pub fn approved_only(self, approved_only: bool) -> Self {
        if approved_only {
            self.equals(APPROVAL_FIELD, APPROVED)
        } else {
            self
        }
    }

    /// Exact match on a categorical field.
    pub fn equals(mut self, field: &str, value: &str) -> Self {
        self.equals.push((field.to_string(), value.to_string()));
        self
    }

    /// Exact match when a value is supplied and non-blank.
    pub fn equals_opt(self, field: &str, value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.equals(field, v),
            _ => self,
        }
    }

    /// Field is absent, null, or the empty string.
    pub fn blank(mut self, field: &str) -> Self {
        self.blank.push(field.to_string());
        self
    }

    /// Inclusive numeric range; a filter with both bounds open is dropped.
    pub fn range(mut self, field: &str, gte: Option<i64>, lte: Option<i64>) -> Self {
        if gte.is_some() || lte.is_some() {
            self.ranges.push((field.to_string(), gte, lte));
        }
        self
    }

    /// At least one of the fields must be present.
    pub fn any_present<S: AsRef<str>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.any_present
            .extend(fields.into_iter().map(|f| f.as_ref().to_string()));
        self
    }

    /// At least one of the sub-filters must hold.
    ///
    /// Empty sub-filters are skipped; if nothing is left the group is dropped.
    pub fn any_of(mut self, alternatives: impl IntoIterator<Item = FilterSpec>) -> Self {
        self.alternatives
            .extend(alternatives.into_iter().filter(|spec| !spec.is_empty()));
        self
    }

    /// Free-text clause.
    pub fn text(mut self, text: Option<TextMatch>) -> Self {
        self.text = text;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
            && self.blank.is_empty()
            && self.ranges.is_empty()
            && self.any_present.is_empty()
            && self.alternatives.is_empty()
            && self.text.is_none()
    }

    /// Compile into a single predicate.
    pub fn build(&self) -> Predicate {
        if self.is_empty() {
            return Predicate::MatchAll;
        }

        let mut query = BoolQuery::new();

        for (field, value) in &self.equals {
            query = query.must(Predicate::term(keyword(field), value.as_str()));
        }

        for field in &self.blank {
            let field = keyword(field);
            query = query.must(
                BoolQuery::any_of([
                    BoolQuery::new()
                        .must_not(Predicate::exists(field.clone()))
                        .into_predicate(),
                    Predicate::term(field, ""),
                ])
                .into_predicate(),
            );
        }

        for (field, gte, lte) in &self.ranges {
            query = query.must(Predicate::Range {
                field: field.clone(),
                gte: *gte,
                lte: *lte,
            });
        }

        if !self.any_present.is_empty() {
            query = query.must(
                BoolQuery::any_of(
                    self.any_present
                        .iter()
                        .map(|field| Predicate::exists(keyword(field))),
                )
                .into_predicate(),
            );
        }

        match self.alternatives.as_slice() {
            [] => {}
            [only] => query = query.must(only.build()),
            many => {
                query = query.must(
                    BoolQuery::any_of(many.iter().map(FilterSpec::build)).into_predicate(),
                );
            }
        }

        if let Some(ref text) = self.text {
            query = query.must(text.to_predicate());
        }

        query.into_predicate()
    }
}

/// Escape wildcard metacharacters so user input matches literally.
fn escape_wildcards(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
