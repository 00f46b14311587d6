//! # Folio HTTP API Module
//!
//! This module implements the HTTP API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /tags/{classmark}` - Aggregated tags, format negotiated via `Accept`
//! - `GET /tags/{classmark}.{ext}` - Aggregated tags, `ext` in json/xml/csv/txt
//!
//! Both tag routes accept `?sources=a,b` to restrict the aggregation.
//! The tag endpoint itself is `/{classmark}`; `/tags` is only the prefix
//! it is mounted under.
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `FOLIO_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `FOLIO_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)

mod error;
mod handlers;
mod middleware;
mod types;

pub use error::ApiError;
pub use handlers::{health_handler, send_tag_response, tags_handler};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{AcceptHeader, HealthResponse, TagQuery, TagRequest};

use crate::sources::TagSourceRegistry;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use folio_core::FolioError;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the source registry every request selects from.
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<TagSourceRegistry>,
}

impl AppState {
    /// Create new app state around a registry.
    #[must_use]
    pub fn new(registry: TagSourceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `FOLIO_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("FOLIO_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (FOLIO_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in FOLIO_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                read_only_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: No FOLIO_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    read_only_cors(origins)
}

/// The API is read-only: GET plus preflight, with content negotiation.
fn read_only_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::ACCEPT])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting - global request budget (if enabled)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // `{classmark}` may carry a format extension; the handler splits it off.
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/tags/{classmark}", get(handlers::tags_handler));

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(addr: &str, registry: TagSourceRegistry) -> Result<(), FolioError> {
    let state = AppState::new(registry);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| FolioError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Folio HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FolioError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
