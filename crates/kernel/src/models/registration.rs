//! Registration document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Hit;

/// A raw registration record as returned to the client.
///
/// The source document is passed through untouched; only the store id is
/// lifted to the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub id: String,

    #[serde(flatten)]
    pub source: Map<String, Value>,
}

impl From<Hit> for RegistrationRecord {
    fn from(hit: Hit) -> Self {
        let mut source = match hit.source {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        source.remove("id");
        Self { id: hit.id, source }
    }
}
