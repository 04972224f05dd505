//! Router for the passkey ceremony endpoints

use std::sync::Arc;

use axum::{Router, routing::get};
use passkey_ceremony::Coordinator;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::passkey::{ping, router_login, router_register};

/// Create a router for the ceremony endpoints
///
/// - `GET  /register/start/{username}`
/// - `POST /register/finish/{username}`
/// - `GET  /login/start/{username}`
/// - `POST /login/finish/{username}`
/// - `GET  /ping`
///
/// Requests are traced at INFO with millisecond latency.
pub fn passkey_ceremony_router(coordinator: Arc<Coordinator>) -> Router {
    passkey_ceremony_router_no_trace(coordinator).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`passkey_ceremony_router`] without the HTTP tracing middleware.
pub fn passkey_ceremony_router_no_trace(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .nest("/register", router_register())
        .nest("/login", router_login())
        .route("/ping", get(ping))
        .with_state(coordinator)
}
