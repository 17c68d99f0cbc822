//! Integration tests for the Symmetria HTTP API.
//!
//! Uses axum-test to drive the router without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Mutex;
use symmetria::api::{AppState, HealthResponse, create_router};
use symmetria::bridge::CommandBridge;
use symmetria::bridge::protocol::Response;
use symmetria::config::ServerConfig;
use symmetria_core::LevelSession;

/// Mutex to serialize tests since auth tests modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("SYMMETRIA_API_KEY") };
    }
}

fn lock() -> std::sync::MutexGuard<'static, ()> {
    AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

fn server_for(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).unwrap()
}

/// Test server over a fresh session, without authentication.
fn create_test_server() -> (TestServer, AppState, TestGuard) {
    let guard = lock();
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("SYMMETRIA_API_KEY") };
    let state = AppState::new(CommandBridge::new(LevelSession::default()));
    (server_for(state.clone()), state, TestGuard { _guard: guard })
}

/// Test server requiring `api_key`.
fn create_auth_test_server(api_key: &str) -> (TestServer, TestGuard) {
    let guard = lock();
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("SYMMETRIA_API_KEY", api_key) };
    let state = AppState::new(CommandBridge::new(LevelSession::default()));
    (server_for(state), TestGuard { _guard: guard })
}

async fn command(server: &TestServer, body: Value) -> (StatusCode, Response) {
    let response = server.post("/command").json(&body).await;
    (response.status_code(), response.json())
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _state, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// COMMAND ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_get_state_before_any_level() {
    let (server, _state, _guard) = create_test_server();

    let (status, response) = command(&server, json!({"seq": 1, "cmd": "get_state"})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.ok);
    assert_eq!(response.status, "OK");
    assert_eq!(response.seq, Some(1));
    let data = response.data.unwrap();
    assert_eq!(data["session"]["state"], "unloaded");
    assert!(data["session"]["level"].is_null());
}

#[tokio::test]
async fn test_load_and_solve_triangle_over_http() {
    let (server, _state, _guard) = create_test_server();

    let (status, _) = command(
        &server,
        json!({"seq": 1, "cmd": "load_level", "args": {"level_id": "act1_level01"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rotations = [
        json!({"0": 0, "1": 1, "2": 2}),
        json!({"0": 1, "1": 2, "2": 0}),
        json!({"0": 2, "1": 0, "2": 1}),
    ];
    let mut kinds = Vec::new();
    for (i, mapping) in rotations.into_iter().enumerate() {
        let (status, response) = command(
            &server,
            json!({"seq": 2 + i, "cmd": "submit_permutation", "args": {"mapping": mapping}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        kinds.extend(
            response
                .events
                .iter()
                .map(|e| e["type"].as_str().unwrap().to_string()),
        );
    }

    assert_eq!(
        kinds,
        [
            "symmetry_found",
            "symmetry_found",
            "symmetry_found",
            "level_completed"
        ]
    );
}

#[tokio::test]
async fn test_unknown_level_is_404_not_found() {
    let (server, _state, _guard) = create_test_server();

    let (status, response) = command(
        &server,
        json!({"cmd": "load_level", "args": {"level_id": "act9_level99"}}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!response.ok);
    assert_eq!(response.status, "NOT_FOUND");
}

#[tokio::test]
async fn test_swap_without_level_is_conflict() {
    let (server, _state, _guard) = create_test_server();

    let (status, response) =
        command(&server, json!({"cmd": "swap", "args": {"a": 0, "b": 1}})).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response.status, "NoLevelLoaded");
}

#[tokio::test]
async fn test_out_of_range_swap_is_bad_request() {
    let (server, _state, _guard) = create_test_server();
    command(
        &server,
        json!({"cmd": "load_level", "args": {"level_id": "act1_level02"}}),
    )
    .await;

    let (status, response) =
        command(&server, json!({"cmd": "swap", "args": {"a": 0, "b": 7}})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.status, "InvalidSlot");
}

#[tokio::test]
async fn test_unknown_command_is_bad_request() {
    let (server, _state, _guard) = create_test_server();

    let (status, response) = command(&server, json!({"cmd": "teleport"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.status, "UnknownCommand");
}

#[tokio::test]
async fn test_malformed_body_is_protocol_error() {
    let (server, _state, _guard) = create_test_server();

    let response = server.post("/command").text("{\"cmd\": ").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Response = response.json();
    assert_eq!(body.status, "InvalidArgs");
    assert_eq!(body.seq, None);
}

#[tokio::test]
async fn test_stale_seq_is_conflict() {
    let (server, _state, _guard) = create_test_server();

    command(&server, json!({"seq": 10, "cmd": "get_state"})).await;
    let (status, response) = command(&server, json!({"seq": 9, "cmd": "get_state"})).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response.status, "OutOfOrder");
}

#[tokio::test]
async fn test_quit_signals_shutdown_and_terminates() {
    let (server, state, _guard) = create_test_server();

    let (status, _) = command(&server, json!({"cmd": "quit"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(*state.shutdown.borrow());

    // Resolves immediately once the flag is set.
    state.terminated().await;

    let (status, response) = command(&server, json!({"cmd": "get_state"})).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(response.status, "Terminated");
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let _guard = lock();
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("SYMMETRIA_API_KEY") };
    let config = ServerConfig {
        rate_limit: 1,
        ..ServerConfig::default()
    };
    let state = AppState::with_config(CommandBridge::new(LevelSession::default()), &config);
    let server = server_for(state);

    server.get("/health").await.assert_status_ok();
    let second = server.get("/health").await;

    assert_eq!(second.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .post("/command")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .json(&json!({"cmd": "get_map_state"}))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .post("/command")
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .json(&json!({"cmd": "get_state"}))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = create_auth_test_server("correct-key");

    let response = server
        .post("/command")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .json(&json!({"cmd": "get_state"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = create_auth_test_server("required-key");

    let response = server
        .post("/command")
        .json(&json!({"cmd": "get_state"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let (server, _guard) = create_auth_test_server("secret-key-for-bypass-test");

    let response = server.get("/health").await;

    response.assert_status_ok();
}
