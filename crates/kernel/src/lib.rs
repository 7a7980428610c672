//! Sajili Kernel Library
//!
//! Registry browsing over a document search index: location aggregation,
//! opaque place ids, offset and keyset pagination, identity enrichment.
//! The main entry point for running the server is the `sajili` binary.

pub mod aggregate;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod query;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
