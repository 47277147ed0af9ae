//! Axum-based mock of the auth server and record data service
//!
//! A single server runs on a fixed port for the whole test binary. Tests that
//! change its behavior reset it first and run serially.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU16, AtomicUsize, Ordering},
    sync::{Arc, LazyLock, Mutex},
    thread,
};

/// Fixed port for the mock server
pub const MOCK_PORT: u16 = 9877;
pub const MOCK_AUTH_URL: &str = "http://127.0.0.1:9877/aaa";
pub const MOCK_BACKEND_URL: &str = "http://127.0.0.1:9877/api/v1";
pub const SESSION_COOKIE: &str = "console_session";

/// Shared state for the mock server
#[derive(Clone)]
pub struct MockServerState {
    /// Status the refresh route answers with when a session cookie is present
    pub refresh_status: Arc<AtomicU16>,
    pub refresh_calls: Arc<AtomicUsize>,
    pub logout_calls: Arc<AtomicUsize>,
    /// Cookie header of the last auth request
    pub last_cookie: Arc<Mutex<Option<String>>>,
}

impl Default for MockServerState {
    fn default() -> Self {
        Self {
            refresh_status: Arc::new(AtomicU16::new(200)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            logout_calls: Arc::new(AtomicUsize::new(0)),
            last_cookie: Arc::new(Mutex::new(None)),
        }
    }
}

impl MockServerState {
    pub fn reset(&self) {
        self.refresh_status.store(200, Ordering::SeqCst);
        self.refresh_calls.store(0, Ordering::SeqCst);
        self.logout_calls.store(0, Ordering::SeqCst);
        *self.last_cookie.lock().unwrap() = None;
    }

    pub fn set_refresh_status(&self, status: u16) {
        self.refresh_status.store(status, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn last_cookie(&self) -> Option<String> {
        self.last_cookie.lock().unwrap().clone()
    }
}

pub struct TestServerContext {
    pub state: MockServerState,
    _thread_handle: thread::JoinHandle<()>,
}

impl TestServerContext {
    fn new() -> Self {
        let state = MockServerState::default();
        let state_clone = state.clone();

        let thread_handle = thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(async {
                let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{MOCK_PORT}"))
                    .await
                    .expect("Failed to bind mock server");
                axum::serve(listener, create_mock_app(state_clone))
                    .await
                    .expect("Mock server error");
            });
        });

        wait_for_server_ready();

        TestServerContext {
            state,
            _thread_handle: thread_handle,
        }
    }
}

static TEST_SERVER: LazyLock<TestServerContext> = LazyLock::new(TestServerContext::new);

/// Get the shared mock server, reset to its default behavior
pub fn mock_server() -> &'static TestServerContext {
    let server = &*TEST_SERVER;
    server.state.reset();
    server
}

fn wait_for_server_ready() {
    for _ in 0..50 {
        if std::net::TcpStream::connect(format!("127.0.0.1:{MOCK_PORT}")).is_ok() {
            return;
        }
        thread::sleep(std::time::Duration::from_millis(100));
    }
    panic!("Mock server failed to start within timeout");
}

fn create_mock_app(state: MockServerState) -> Router {
    Router::new()
        .route("/aaa/token-names", get(token_names))
        .route("/aaa/refresh", get(refresh))
        .route("/aaa/logout", get(logout))
        .route("/api/v1/users", get(list_users).post(create_user))
        .route(
            "/api/v1/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/api/v1/categories/{archive}/subject-class/",
            get(subject_classes),
        )
        .route("/api/v1/moderators", get(forbidden))
        .with_state(state)
}

/// Token in the auth server's format expiring `secs` from now
pub fn session_token(secret: &str, secs: i64) -> String {
    let expires_at = Utc::now() + Duration::seconds(secs);
    format!("{secret},{}", expires_at.format("%Y-%m-%dT%H:%M:%SZ"))
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

fn remember_cookie(state: &MockServerState, headers: &HeaderMap) {
    *state.last_cookie.lock().unwrap() = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
}

async fn token_names() -> Json<Value> {
    Json(json!({"session": SESSION_COOKIE, "classic": "tapir_session"}))
}

async fn refresh(State(state): State<MockServerState>, headers: HeaderMap) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    remember_cookie(&state, &headers);

    if session_cookie(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let status = StatusCode::from_u16(state.refresh_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status != StatusCode::OK {
        return status.into_response();
    }

    let cookie = format!(
        "{SESSION_COOKIE}={}; Max-Age=3600; Path=/; SameSite=Lax",
        session_token("renewed", 3600)
    );
    (StatusCode::OK, [(header::SET_COOKIE, cookie)]).into_response()
}

async fn logout(
    State(state): State<MockServerState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    remember_cookie(&state, &headers);

    let next_page = params.get("next_page").cloned().unwrap_or("/".to_string());
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, next_page),
            (
                header::SET_COOKIE,
                format!("{SESSION_COOKIE}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/"),
            ),
        ],
    )
        .into_response()
}

fn users() -> Vec<Value> {
    vec![
        json!({"id": "1", "name": "Ada"}),
        json!({"id": "2", "name": "Grace", "endorser_id": "1"}),
    ]
}

async fn list_users(
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    if session_cookie(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let ids: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "id")
        .map(|(_, v)| v.as_str())
        .collect();
    // Any other field that is not a `_` control parameter filters by equality
    let fields: Vec<&(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "id" && !k.starts_with('_'))
        .collect();
    let data: Vec<Value> = users()
        .into_iter()
        .filter(|u| ids.is_empty() || ids.contains(&u["id"].as_str().unwrap_or_default()))
        .filter(|u| fields.iter().all(|(k, v)| u[k.as_str()] == v.as_str()))
        .collect();

    (
        StatusCode::OK,
        [("x-total-count", data.len().to_string())],
        Json(Value::Array(data)),
    )
        .into_response()
}

async fn get_user(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if session_cookie(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match users().into_iter().find(|u| u["id"] == id.as_str()) {
        Some(user) => Json(user).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_user(headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    if session_cookie(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    body["id"] = json!("3");
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_user(
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    if session_cookie(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    body["id"] = json!(id);
    Json(body).into_response()
}

async fn delete_user(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if session_cookie(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"id": id})).into_response()
}

async fn subject_classes(Path(archive): Path<String>) -> Json<Value> {
    Json(json!([
        {"id": format!("{archive}.AG"), "name": "Algebraic Geometry"},
        {"id": format!("{archive}.NT"), "name": "Number Theory"},
    ]))
}

async fn forbidden() -> StatusCode {
    StatusCode::FORBIDDEN
}
