#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] boots the REAL kernel router and services over an
//! [`InMemoryStore`], so tests exercise actual query building,
//! aggregation, collapsing, paging and enrichment end to end.

#![allow(dead_code)]

mod memory_store;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sajili_kernel::metrics::Metrics;
use sajili_kernel::{AppState, Config, routes};

pub use memory_store::{Failure, InMemoryStore, RecordedCall};

pub const REGISTRATION_INDEX: &str = "registrations";
pub const PERSON_INDEX: &str = "persons";
pub const IDENTITY_INDEX: &str = "identities";

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application over an empty store.
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    /// Create a test application with extra configuration variables.
    pub fn with_vars(extra: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = [
            ("SEARCH_URL", "http://search.invalid:9200"),
            ("SEARCH_REGISTRATION_INDEX", REGISTRATION_INDEX),
            ("SEARCH_PERSON_INDEX", PERSON_INDEX),
            ("SEARCH_IDENTITY_INDEX", IDENTITY_INDEX),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        let config = Config::from_map(&vars).expect("Failed to load config");

        let store = Arc::new(InMemoryStore::new());
        let state = AppState::with_store(&config, store.clone(), Arc::new(Metrics::new()));
        let router = routes::app(state.clone());

        Self {
            router,
            store,
            state,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET a URI and parse the JSON body.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        (status, response_json(response).await)
    }

    /// GET a URI and return the raw body.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        (status, response_text(response).await)
    }
}

pub async fn response_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}

pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}
