//! Configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Search cluster base URL.
    pub search_url: String,

    /// Basic-auth username for the search cluster.
    pub search_username: Option<String>,

    /// Basic-auth password for the search cluster.
    pub search_password: Option<String>,

    /// Index holding registration documents (default: "registrations").
    pub registration_index: String,

    /// Index holding person documents (default: "persons").
    pub person_index: String,

    /// Index holding authoritative identity records (default: person index).
    pub identity_index: String,

    /// Timeout for plain searches and lookups (default: 15s).
    pub search_timeout: Duration,

    /// Timeout for grouped aggregations (default: 60s).
    pub aggregation_timeout: Duration,

    /// Maximum buckets returned by one grouped aggregation (default: 10000).
    pub aggregation_bucket_cap: usize,

    /// Idle pooled connections kept per search host (default: 32).
    pub search_max_connections: usize,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a key/value map.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let search_url =
            lookup("SEARCH_URL").context("SEARCH_URL environment variable is required")?;

        let search_username = lookup("SEARCH_USERNAME").filter(|s| !s.is_empty());
        let search_password = lookup("SEARCH_PASSWORD").filter(|s| !s.is_empty());

        let registration_index =
            lookup("SEARCH_REGISTRATION_INDEX").unwrap_or_else(|| "registrations".to_string());
        let person_index =
            lookup("SEARCH_PERSON_INDEX").unwrap_or_else(|| "persons".to_string());
        let identity_index =
            lookup("SEARCH_IDENTITY_INDEX").unwrap_or_else(|| person_index.clone());

        let search_timeout =
            Duration::from_secs(parse_or(&lookup, "SEARCH_TIMEOUT_SECS", 15u64)?);
        let aggregation_timeout = Duration::from_secs(parse_or(
            &lookup,
            "SEARCH_AGGREGATION_TIMEOUT_SECS",
            60u64,
        )?);

        let aggregation_bucket_cap = parse_or(&lookup, "AGGREGATION_BUCKET_CAP", 10_000usize)?;
        if aggregation_bucket_cap == 0 {
            anyhow::bail!("AGGREGATION_BUCKET_CAP must be at least 1");
        }

        let search_max_connections = parse_or(&lookup, "SEARCH_MAX_CONNECTIONS", 32usize)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            port,
            search_url,
            search_username,
            search_password,
            registration_index,
            person_index,
            identity_index,
            search_timeout,
            aggregation_timeout,
            aggregation_bucket_cap,
            search_max_connections,
            cors_allowed_origins,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => Ok(default),
    }
}
