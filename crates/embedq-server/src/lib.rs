//! embedq-server
//!
//! HTTP front end for the embedding task queue. Handlers only translate
//! between JSON and [`embedq_core::TaskFacade`]; all queue rules live in core.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, StatusCode};
use embedq_core::ports::TaskStore;
use embedq_core::{TaskFacade, TaskQueue};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Wire store -> queue -> facade for the given configuration.
pub fn build_state(config: ServerConfig, store: Arc<dyn TaskStore>) -> AppState {
    let queue = Arc::new(TaskQueue::new(store));
    let facade = TaskFacade::new(queue).with_poll_interval(config.poll_interval());

    AppState {
        facade: Arc::new(facade),
        config: Arc::new(config),
    }
}

/// Build the full router with its middleware stack.
///
/// `main.rs` and the integration tests both go through here, so tests
/// exercise the same layers production uses.
pub fn build_app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let request_timeout = state.config.request_timeout();

    Router::new()
        .merge(routes::health::router())
        .merge(routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}
