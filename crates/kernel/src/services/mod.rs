//! Listing services.
//!
//! Each service owns the components one family of endpoints composes:
//! - locations: filter → aggregate → collapse → offset page
//! - registrations: place id → replayed filter → offset search
//! - persons: filter → keyset search + count → identity enrichment

pub mod locations;
pub mod persons;
pub mod registrations;

use crate::aggregate::IndexKind;
use crate::config::Config;

pub use locations::{LocationQuery, LocationService, PlacePage};
pub use persons::{PersonPage, PersonQuery, PersonService, PersonSortField};
pub use registrations::{PlaceRegistrationsQuery, RegistrationPage, RegistrationService};

/// Index names for each index kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNames {
    pub registrations: String,
    pub persons: String,
    pub identity: String,
}

impl IndexNames {
    pub fn from_config(config: &Config) -> Self {
        Self {
            registrations: config.registration_index.clone(),
            persons: config.person_index.clone(),
            identity: config.identity_index.clone(),
        }
    }

    pub fn resolve(&self, kind: IndexKind) -> &str {
        match kind {
            IndexKind::Registrations => &self.registrations,
            IndexKind::Persons => &self.persons,
            IndexKind::Identity => &self.identity,
        }
    }
}
