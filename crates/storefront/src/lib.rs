//! Oussaili Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Modules
//!
//! - [`documents`] - Hosted document store clients (Firestore REST, in-memory)
//! - [`services`] - Identity provider clients, viewer resolution, cart store, checkout
//! - [`db`] - Typed repositories over the document store
//! - [`middleware`] - Sessions, guarded extractors, toasts
//! - [`routes`] - HTTP handlers and askama templates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

use state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the full application router with static files, sessions and
/// request tracing around the routes.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::serialize_session_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    fn test_app() -> Router {
        app(AppState::new(StorefrontConfig::for_memory_backend(
            "http://localhost:3000",
        )))
    }

    async fn status_of(uri: &str) -> StatusCode {
        test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(status_of("/health").await, StatusCode::OK);
        assert_eq!(status_of("/health/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_nested_api_guards_answer_with_status() {
        assert_eq!(status_of("/api/orders").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/api/admin/stats").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_nested_page_guards_redirect() {
        let response = test_app()
            .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/auth");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        assert_eq!(status_of("/nowhere").await, StatusCode::NOT_FOUND);
    }
}
