//! Query construction module.
//!
//! This module provides:
//! - Predicate: typed boolean predicate tree, serialized to the store's
//!   wire format only at the boundary
//! - FilterSpec: per-request filter description compiled into one predicate
//! - MatchMode: free-text matching strategy (fuzzy, whole word, whole sentence)

mod query_builder;
pub mod types;

pub use query_builder::{FilterSpec, TextMatch};
pub use types::{BoolQuery, MatchMode, Predicate};

/// Document field carrying the record-type discriminator.
pub const RECORD_TYPE_FIELD: &str = "record_type";

/// Document field carrying the registration approval status.
pub const APPROVAL_FIELD: &str = "approval_status";

/// Approval status value for approved records.
pub const APPROVED: &str = "APPROVED";

/// Exact-value sub-field for a free-text field.
///
/// Location and categorical fields are indexed as text with a `keyword`
/// sub-field; equality, existence and grouping always target the latter.
pub fn keyword(field: &str) -> String {
    if field.ends_with(".keyword") {
        field.to_string()
    } else {
        format!("{field}.keyword")
    }
}
