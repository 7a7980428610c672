//! Location aggregation module.
//!
//! This module provides:
//! - BucketAggregator: one bounded grouped-count query over location dimensions
//! - collapse: folds raw buckets into user-facing place records
//! - place_key: reversible opaque tokens for dimension tuples
//! - LocationProfile: which dimensions each listing groups on

mod aggregator;
mod collapse;
pub mod place_key;

use std::collections::BTreeMap;

use serde::Serialize;

pub use aggregator::{BucketAggregator, MAX_DIMENSIONS};
pub use collapse::{collapse, display_label, label_variants};
pub use place_key::PlaceKeyError;

/// Dimension field → value; `None` for documents without the field.
///
/// Keys are kept in canonical (sorted) order.
pub type DimensionTuple = BTreeMap<String, Option<String>>;

/// One raw grouped-count result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionBucket {
    pub tuple: DimensionTuple,
    pub doc_count: u64,
}

/// A user-facing aggregated location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceRecord {
    /// Opaque id replayable as a registration filter.
    pub id: String,

    /// Ordered, comma-joined non-empty dimension values.
    pub label: String,

    /// Place dimension values of the first contributing bucket.
    pub dimensions: DimensionTuple,

    /// Type value of the first contributing bucket.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub representative_type: Option<String>,

    /// Documents across every bucket sharing the label.
    pub count: u64,
}

/// Which index a listing reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Registrations,
    Persons,
    Identity,
}

/// Dimension layout of one aggregated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationProfile {
    pub name: &'static str,
    pub index: IndexKind,
    /// Place dimensions in display order.
    pub place_fields: &'static [&'static str],
    /// Secondary attribute grouped alongside the place, never part of the label.
    pub type_field: Option<&'static str>,
    /// Text fields searched by the free-text term.
    pub search_fields: &'static [&'static str],
}

impl LocationProfile {
    /// All grouped dimensions: place fields, then the type field.
    pub fn dimensions(&self) -> Vec<&'static str> {
        let mut dims = self.place_fields.to_vec();
        dims.extend(self.type_field);
        dims
    }

    /// Whether a decoded tuple has exactly this profile's place fields.
    pub fn accepts(&self, tuple: &DimensionTuple) -> bool {
        tuple.len() == self.place_fields.len()
            && self.place_fields.iter().all(|f| tuple.contains_key(*f))
    }
}

/// Business premises from registration documents.
pub const BUSINESS_LOCATIONS: LocationProfile = LocationProfile {
    name: "business",
    index: IndexKind::Registrations,
    place_fields: &["region", "district", "ward", "street", "road"],
    type_field: Some("premise_type"),
    search_fields: &["region", "district", "ward", "street", "road"],
};

/// Person addresses from the authoritative identity source.
pub const PERSON_IDENTITY_LOCATIONS: LocationProfile = LocationProfile {
    name: "person_identity",
    index: IndexKind::Identity,
    place_fields: &["id_region", "id_district", "id_ward"],
    type_field: None,
    search_fields: &["id_region", "id_district", "id_ward"],
};

/// Person addresses as reported on registration forms.
pub const PERSON_REPORTED_LOCATIONS: LocationProfile = LocationProfile {
    name: "person_reported",
    index: IndexKind::Persons,
    place_fields: &["region", "district", "ward", "street", "road"],
    type_field: Some("residence_type"),
    search_fields: &["region", "district", "ward", "street", "road"],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_fit_the_dimension_limit() {
        for profile in [
            BUSINESS_LOCATIONS,
            PERSON_IDENTITY_LOCATIONS,
            PERSON_REPORTED_LOCATIONS,
        ] {
            assert!(profile.dimensions().len() <= MAX_DIMENSIONS, "{}", profile.name);
        }
    }

    #[test]
    fn type_field_follows_place_fields() {
        let dims = PERSON_REPORTED_LOCATIONS.dimensions();
        assert_eq!(dims.len(), 6);
        assert_eq!(dims[5], "residence_type");
        assert_eq!(PERSON_IDENTITY_LOCATIONS.dimensions().len(), 3);
    }

    #[test]
    fn accepts_requires_exact_place_fields() {
        let mut tuple = DimensionTuple::new();
        tuple.insert("id_region".to_string(), Some("Dodoma".to_string()));
        tuple.insert("id_district".to_string(), None);
        tuple.insert("id_ward".to_string(), None);
        assert!(PERSON_IDENTITY_LOCATIONS.accepts(&tuple));
        assert!(!BUSINESS_LOCATIONS.accepts(&tuple));

        tuple.insert("premise_type".to_string(), None);
        assert!(!PERSON_IDENTITY_LOCATIONS.accepts(&tuple));
    }
}
