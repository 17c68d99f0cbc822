//! # Symmetria HTTP API Module
//!
//! HTTP transport for the command bridge, built on axum.
//!
//! ## Endpoints
//!
//! - `POST /command` - One protocol request per body, one response record back
//! - `GET /health` - Health check
//!
//! All requests go through one `CommandBridge` behind a mutex, so concurrent
//! HTTP clients are serialized in arrival order. A processed `quit` shuts the
//! server down gracefully.
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `SYMMETRIA_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `SYMMETRIA_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `SYMMETRIA_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{get_api_key_from_env, keys_match};
pub use handlers::{command_handler, health_handler, status_for};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::HealthResponse;

use crate::bridge::CommandBridge;
use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use symmetria_core::SymmetriaError;
use tokio::sync::{Mutex, watch};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The bridge owning the session.
    pub bridge: Arc<Mutex<CommandBridge>>,
    /// Flipped to `true` once the bridge has processed `quit`.
    pub shutdown: Arc<watch::Sender<bool>>,
    /// Requests per second; `0` disables rate limiting.
    pub rate_limit: u32,
    pub body_limit_bytes: usize,
}

impl AppState {
    /// State with default server settings.
    #[must_use]
    pub fn new(bridge: CommandBridge) -> Self {
        Self::with_config(bridge, &ServerConfig::default())
    }

    #[must_use]
    pub fn with_config(bridge: CommandBridge, config: &ServerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            bridge: Arc::new(Mutex::new(bridge)),
            shutdown: Arc::new(shutdown),
            rate_limit: config.rate_limit,
            body_limit_bytes: config.body_limit_bytes,
        }
    }

    /// Wait until `quit` has been processed.
    pub async fn terminated(&self) {
        let mut rx = self.shutdown.subscribe();
        // An error means the sender is gone, which only happens at teardown.
        let _ = rx.wait_for(|terminated| *terminated).await;
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from an origins setting.
///
/// - `"*"`: allows all origins (development only)
/// - `None`: localhost only
/// - Otherwise: comma-separated list of allowed origins
pub fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (SYMMETRIA_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed = parse_origins(origins);
            if allowed.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in SYMMETRIA_CORS_ORIGINS, defaulting to localhost only"
                );
                restricted_cors(localhost_origins())
            } else {
                restricted_cors(allowed)
            }
        }
        None => {
            tracing::info!("CORS: No SYMMETRIA_CORS_ORIGINS set, defaulting to localhost only");
            restricted_cors(localhost_origins())
        }
    }
}

fn parse_origins(origins: &str) -> Vec<HeaderValue> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

fn localhost_origins() -> Vec<HeaderValue> {
    [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect()
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if `SYMMETRIA_API_KEY` is set)
pub fn create_router(state: AppState) -> Router {
    let cors_origins = std::env::var("SYMMETRIA_CORS_ORIGINS").ok();
    let cors = build_cors_layer(cors_origins.as_deref());

    let rate_limiter = create_rate_limiter(state.rate_limit);
    match &rate_limiter {
        Some(_) => tracing::info!("Rate limiting enabled: {} requests/second", state.rate_limit),
        None => tracing::info!("Rate limiting disabled"),
    }

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - /command is publicly accessible. \
             Set SYMMETRIA_API_KEY to enable authentication."
        );
    }

    let body_limit = state.body_limit_bytes;
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/command", post(handlers::command_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve until `quit` is processed or Ctrl+C is received.
pub async fn run_server(config: &ServerConfig, bridge: CommandBridge) -> Result<(), SymmetriaError> {
    let state = AppState::with_config(bridge, config);
    let router = create_router(state.clone());
    let addr = config.addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SymmetriaError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Symmetria HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| SymmetriaError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = state.terminated() => tracing::info!("quit processed, shutting down"),
        () = ctrl_c => tracing::info!("Ctrl+C received, shutting down"),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_invalid_ones_skipped() {
        let parsed = parse_origins(" http://a.example , ,bad\u{7f}origin,http://b.example");
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn localhost_defaults_are_valid() {
        assert_eq!(localhost_origins().len(), 4);
    }
}
