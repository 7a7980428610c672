//! Index document models.

pub mod person;
pub mod record_type;
pub mod registration;

pub use person::PersonRecord;
pub use record_type::RecordType;
pub use registration::RegistrationRecord;
