//! Nairex REST API
//!
//! Thin transport over the service layer:
//!
//! ```text
//! /api/v1/
//! ├── /accounts          - signup, webhook settings
//! ├── /users             - sub-accounts, wallets, swaps, withdraws, deposits
//! └── /markets           - static tickers
//! ```
//!
//! Authentication is an opaque bearer token resolved against the metadata
//! store; handlers that need a principal take the [`extractors::CurrentUser`]
//! extractor. Panics are recovered and surface as `FATAL_ERROR`.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

use std::any::Any;
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Per-request handling budget, matched to the server's read/write
    /// timeout.
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { request_timeout: Duration::from_secs(15) }
    }
}

/// Build the application router with the full middleware stack.
pub fn create_router(state: AppState, config: ApiConfig) -> Router {
    Router::new()
        .merge(routes::api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(CatchPanicLayer::custom(recover_panic))
        .with_state(state)
}

/// Recovered handler panics become the standard fatal envelope.
fn recover_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(detail = %detail, "recovered handler panic");
    ApiError::from(nairex_types::Error::fatal(detail)).into_response()
}
