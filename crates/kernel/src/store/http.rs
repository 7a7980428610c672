//! REST client for an Elasticsearch-compatible search cluster.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use super::{DocumentStore, SearchRequest, SearchResponse, StoreError};
use crate::config::Config;
use crate::metrics::Metrics;
use crate::query::Predicate;

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Document store backed by the search cluster's HTTP API.
///
/// Holds one pooled `reqwest::Client`, reused by every request.
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    metrics: Arc<Metrics>,
}

impl HttpDocumentStore {
    /// Create a store client from configuration.
    pub fn new(config: &Config, metrics: Arc<Metrics>) -> Result<Self> {
        let mut raw = config.search_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).context("SEARCH_URL must be a valid URL")?;

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.search_max_connections)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("failed to build search HTTP client")?;

        Ok(Self {
            client,
            base_url,
            username: config.search_username.clone(),
            password: config.search_password.clone(),
            metrics,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Request(format!("invalid store path '{path}': {e}")))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.username {
            Some(ref username) => builder.basic_auth(username, self.password.as_ref()),
            None => builder,
        }
    }

    /// POST a JSON body and decode the JSON reply.
    async fn post_json(
        &self,
        operation: &'static str,
        path: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, StoreError> {
        let url = self.endpoint(path)?;
        let started = Instant::now();

        let result = self.send(url, body, timeout).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(StoreError::Timeout) => "timeout",
            Err(_) => "error",
        };
        self.metrics
            .observe_store_request(operation, outcome, started.elapsed());
        debug!(
            operation,
            path,
            outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search store request"
        );

        result
    }

    async fn send(&self, url: Url, body: &Value, timeout: Duration) -> Result<Value, StoreError> {
        let response = self
            .authorize(self.client.post(url))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(e)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
        timeout: Duration,
    ) -> Result<SearchResponse, StoreError> {
        let body = self
            .post_json("search", &format!("{index}/_search"), &request.to_wire(), timeout)
            .await?;

        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        if response.timed_out {
            warn!(index, "search store reported a partial (timed out) result");
            return Err(StoreError::Timeout);
        }
        Ok(response)
    }

    async fn count(
        &self,
        index: &str,
        query: &Predicate,
        timeout: Duration,
    ) -> Result<u64, StoreError> {
        let body = self
            .post_json(
                "count",
                &format!("{index}/_count"),
                &json!({ "query": query.to_wire() }),
                timeout,
            )
            .await?;

        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::Decode("count response without 'count'".to_string()))
    }

    async fn ping(&self) -> bool {
        let Ok(url) = self.endpoint("_cluster/health") else {
            return false;
        };
        match self
            .authorize(self.client.get(url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "search store health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn store(url: &str) -> Result<HttpDocumentStore> {
        let vars: HashMap<String, String> = [("SEARCH_URL".to_string(), url.to_string())]
            .into_iter()
            .collect();
        let config = Config::from_map(&vars).unwrap();
        HttpDocumentStore::new(&config, Arc::new(Metrics::new()))
    }

    #[test]
    fn endpoints_keep_a_path_prefix() {
        let store = store("https://search.example.org/cluster-a").unwrap();
        assert_eq!(
            store.endpoint("registrations/_search").unwrap().as_str(),
            "https://search.example.org/cluster-a/registrations/_search"
        );
    }

    #[test]
    fn invalid_url_fails_at_startup() {
        assert!(store("not a url").is_err());
    }
}
