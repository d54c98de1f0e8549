//! HTTP route handlers for the curator.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (collection store reachable)
//!
//! # Auth (Shopify OAuth)
//! GET  /auth/shopify           - Start install for the configured store
//! GET  /auth/shopify/callback  - Verify, exchange code, store session
//!
//! # Products (read from Shopify)
//! GET  /products               - Product selection page
//! GET  /api/products           - First page of products as JSON
//! GET  /api/products/{id}      - One product (REST Admin API)
//!
//! # Collections
//! GET  /collections            - Saved collections
//! POST /collections            - Save a selection (form or JSON), 303 to /collections
//! GET  /api/collections/{id}   - One saved collection as JSON
//! ```
//!
//! Every product and collection route requires a Shopify session.

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

pub mod auth;
pub mod collections;
pub mod health;
pub mod products;

/// All routes, without state or layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(collections::router())
}

/// The application router with sessions, request tracing and state.
///
/// Sentry layers are added by the binary.
pub fn app<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
