//! Bucket collapsing.
//!
//! Raw buckets differ on every dimension, including ones the user never
//! sees (null vs. empty string, the type dimension). Buckets are folded by
//! their display label instead; the first bucket seen for a label supplies
//! the id, dimension values and type of the resulting record.

use std::collections::HashMap;

use super::place_key::{self, PlaceKeyError};
use super::{DimensionBucket, DimensionTuple, LocationProfile, PlaceRecord};

/// Label separator.
const LABEL_SEPARATOR: &str = ", ";

/// Ordered, comma-joined non-empty values of the profile's place fields.
pub fn display_label(tuple: &DimensionTuple, profile: &LocationProfile) -> String {
    profile
        .place_fields
        .iter()
        .filter_map(|field| tuple.get(*field).and_then(Option::as_deref))
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR)
}

/// Every place tuple rendering the same label as `tuple`.
///
/// The non-empty values keep their order and are spread over each
/// increasing choice of place fields; the remaining fields are `None`.
/// A value that itself contains the label separator is not split.
pub fn label_variants(tuple: &DimensionTuple, profile: &LocationProfile) -> Vec<DimensionTuple> {
    let values: Vec<&str> = profile
        .place_fields
        .iter()
        .filter_map(|field| tuple.get(*field).and_then(Option::as_deref))
        .filter(|value| !value.is_empty())
        .collect();
    let fields = profile.place_fields;

    (0u32..1 << fields.len())
        .filter(|mask| mask.count_ones() as usize == values.len())
        .map(|mask| {
            let mut next = values.iter();
            fields
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let value = if mask & (1 << i) != 0 {
                        next.next().map(|v| v.to_string())
                    } else {
                        None
                    };
                    (field.to_string(), value)
                })
                .collect()
        })
        .collect()
}

/// Collapse raw buckets into place records sorted by count, descending.
///
/// Buckets without any non-empty place value are dropped. Ties keep
/// traversal order.
pub fn collapse(
    buckets: Vec<DimensionBucket>,
    profile: &LocationProfile,
) -> Result<Vec<PlaceRecord>, PlaceKeyError> {
    let mut records: Vec<PlaceRecord> = Vec::new();
    let mut by_label: HashMap<String, usize> = HashMap::new();

    for bucket in buckets {
        let label = display_label(&bucket.tuple, profile);
        if label.is_empty() {
            continue;
        }

        if let Some(&idx) = by_label.get(&label) {
            records[idx].count += bucket.doc_count;
            continue;
        }

        let dimensions: DimensionTuple = profile
            .place_fields
            .iter()
            .map(|field| {
                let value = bucket.tuple.get(*field).cloned().flatten();
                (field.to_string(), value)
            })
            .collect();
        let representative_type = profile
            .type_field
            .and_then(|field| bucket.tuple.get(field).cloned().flatten());

        by_label.insert(label.clone(), records.len());
        records.push(PlaceRecord {
            id: place_key::encode(&dimensions)?,
            label,
            dimensions,
            representative_type,
            count: bucket.doc_count,
        });
    }

    // Stable: equal counts keep first-seen order
    records.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(records)
}
