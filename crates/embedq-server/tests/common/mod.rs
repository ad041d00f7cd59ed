use std::net::Ipv4Addr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use embedq_core::impls::InMemoryTaskStore;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use embedq_server::config::ServerConfig;
use embedq_server::state::AppState;
use embedq_server::{build_app, build_state};

pub const TOKEN: &str = "test-token";

/// Build a test `ServerConfig` with safe defaults and a short poll interval.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        auth_token: TOKEN.to_string(),
        database_url: None,
        request_timeout_secs: 30,
        submit_wait_max_secs: 5,
        poll_interval_ms: 10,
    }
}

/// Shared state over a fresh in-memory store.
///
/// Tests that need to drive the queue directly (e.g. a background worker)
/// keep the state and build the router from a clone.
pub fn test_state() -> AppState {
    build_state(test_config(), Arc::new(InMemoryTaskStore::new()))
}

/// The full router with the same middleware stack `main.rs` uses.
pub fn build_test_app() -> Router {
    build_app(test_state())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
