//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `scanner` - Scanner lifecycle (status, start, stop)
//! - `events` - The detection event log
//! - `advisory` - Safety advisory retrieval and dismissal
//! - `health` - Service health checks
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod advisory;
pub mod error;
pub mod events;
pub mod health;
pub mod openapi;
pub mod scanner;

// Re-export commonly used types
#[allow(unused_imports)]
pub use error::{ApiError, ApiResult, ErrorResponse};

// Re-export OpenAPI utilities for the gen-openapi binary
#[allow(unused_imports)]
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                - Health check
/// /api
/// ├── /scanner           - Scanner status
/// ├── /scanner/start     - Start scanning
/// ├── /scanner/stop      - Stop scanning and reset
/// ├── /events            - Detection event log
/// ├── /advisory          - Current safety advisory (GET, DELETE)
/// └── /openapi.json      - OpenAPI specification
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .route("/scanner", get(scanner::get_status))
                .route("/scanner/start", post(scanner::start_scanner))
                .route("/scanner/stop", post(scanner::stop_scanner))
                .route("/events", get(events::get_events))
                .route(
                    "/advisory",
                    get(advisory::get_advisory).delete(advisory::dismiss_advisory),
                )
                .route("/openapi.json", get(openapi::get_openapi_spec)),
        )
        // The companion mobile client is served from another origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
