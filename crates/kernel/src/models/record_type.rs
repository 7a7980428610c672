//! Record-type discriminator.

use serde::{Deserialize, Serialize};

/// Kind of registration a document belongs to.
///
/// Every listing is scoped to exactly one record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Incorporated company.
    Company,
    /// Registered business name (sole proprietor or partnership).
    BusinessName,
}

impl RecordType {
    /// Value stored in the `record_type` document field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Company => "company",
            RecordType::BusinessName => "business_name",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
