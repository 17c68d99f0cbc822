//! # API Endpoint Handlers

use super::{AppState, types::HealthResponse};
use crate::bridge::protocol::{ErrorKind, Response};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// COMMAND HANDLER
// =============================================================================

/// HTTP status for a response record.
#[must_use]
pub fn status_for(response: &Response) -> StatusCode {
    match response.error_kind() {
        None => StatusCode::OK,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::InvalidArgs | ErrorKind::InvalidSlot | ErrorKind::UnknownCommand) => {
            StatusCode::BAD_REQUEST
        }
        Some(ErrorKind::NoLevelLoaded | ErrorKind::OutOfOrder) => StatusCode::CONFLICT,
        Some(ErrorKind::Terminated) => StatusCode::GONE,
        Some(ErrorKind::InvariantViolation) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Execute one protocol request.
///
/// The body is taken as raw text so that malformed JSON produces a protocol
/// `InvalidArgs` record rather than axum's own rejection.
pub async fn command_handler(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let (response, terminated) = {
        let mut bridge = state.bridge.lock().await;
        let response = bridge.handle_line(&body);
        (response, bridge.is_terminated())
    };

    if terminated {
        state.shutdown.send_replace(true);
    }

    (status_for(&response), Json(response))
}
