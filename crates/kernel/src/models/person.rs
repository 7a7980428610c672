//! Person document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Hit;

/// A person associated with a registration (director, shareholder,
/// partner, owner).
///
/// Only the fields the listing engine reasons about are typed; everything
/// else in the source document is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub full_name: Option<String>,

    /// Identity key shared by every document describing the same person.
    #[serde(default)]
    pub national_id: Option<String>,

    /// Recorded nationality; inconsistently captured across sources.
    #[serde(default)]
    pub nationality: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonRecord {
    /// Build from a search hit, falling back to the store id when the
    /// source has none.
    pub fn from_hit(hit: Hit) -> Result<Self, serde_json::Error> {
        let mut record: PersonRecord = serde_json::from_value(hit.source)?;
        if record.id.is_empty() {
            record.id = hit.id;
        }
        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_round_trip() {
        let hit = Hit {
            id: "p-1".to_string(),
            source: json!({
                "full_name": "Amina Juma",
                "national_id": "19800101-00001-00001-11",
                "nationality": "Tanzanian",
                "role": "director",
                "age": 44
            }),
            sort: vec![],
        };

        let record = PersonRecord::from_hit(hit).unwrap();
        assert_eq!(record.id, "p-1");
        assert_eq!(record.nationality.as_deref(), Some("Tanzanian"));
        assert_eq!(record.extra["role"], json!("director"));

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["age"], json!(44));
        assert_eq!(out["id"], json!("p-1"));
    }

    #[test]
    fn null_nationality_is_none() {
        let hit = Hit {
            id: "p-2".to_string(),
            source: json!({ "id": "p-2", "nationality": null }),
            sort: vec![],
        };
        let record = PersonRecord::from_hit(hit).unwrap();
        assert!(record.nationality.is_none());
    }
}
