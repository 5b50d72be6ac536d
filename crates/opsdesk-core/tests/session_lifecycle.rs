//! End-to-end session behaviour against a local mock backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use opsdesk_core::api::{ApiError, Resources};
use opsdesk_core::auth::{
    AuthProvider, LoginRedirect, MemoryTokenStore, Navigator, SessionData, SessionListener,
    SessionState, TokenStore,
};
use opsdesk_core::models::Client;
use opsdesk_core::ApiClient;

const VALID_TOKEN: &str = "fresh-token";

#[derive(Clone, Default)]
struct Backend {
    seen_auth: Arc<Mutex<Vec<Option<String>>>>,
    seen_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl Backend {
    fn seen_auth(&self) -> Vec<Option<String>> {
        self.seen_auth.lock().unwrap().clone()
    }

    fn seen_queries(&self) -> Vec<HashMap<String, String>> {
        self.seen_queries.lock().unwrap().clone()
    }
}

async fn list_clients(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.seen_auth.lock().unwrap().push(auth.clone());

    match auth.as_deref() {
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        ),
        Some(value) if value == format!("Bearer {}", VALID_TOKEN) => (
            StatusCode::OK,
            Json(json!({
                "count": 2,
                "next": null,
                "previous": null,
                "results": [
                    {"id": 1, "name": "Acme Ltd"},
                    {"id": 2, "name": "Borealis Builders", "contact_name": "Sam Ortiz"}
                ]
            })),
        ),
        Some(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "code": "token_not_valid",
                "detail": "Given token not valid for any token type"
            })),
        ),
    }
}

async fn obtain_token(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["username"] == "dana" && body["password"] == "correct horse" {
        (
            StatusCode::OK,
            Json(json!({"access": VALID_TOKEN, "refresh": "refresh-1"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
    }
}

/// Two pages of milestones for job 5; the best-ordered one is on page 2.
async fn list_milestones(
    State(backend): State<Backend>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.seen_queries.lock().unwrap().push(params.clone());
    match params.get("page").map(String::as_str) {
        Some("2") => Json(json!({
            "count": 3,
            "next": null,
            "previous": "/api/milestones/?job=5",
            "results": [{"id": 3, "job": 5, "title": "Survey", "sort_order": 1}]
        })),
        _ => Json(json!({
            "count": 3,
            "next": "/api/milestones/?job=5&page=2",
            "previous": null,
            "results": [
                {"id": 1, "job": 5, "title": "Framing", "sort_order": 2},
                {"id": 2, "job": 5, "title": "Roofing", "sort_order": 3}
            ]
        })),
    }
}

async fn patch_client(Path(id): Path<i64>, Json(mut body): Json<Value>) -> Json<Value> {
    body["id"] = json!(id);
    Json(body)
}

async fn download_document(Path(id): Path<i64>) -> (StatusCode, [(header::HeaderName, &'static str); 1], Vec<u8>) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vec![id as u8, 0xCA, 0xFE],
    )
}

async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/clients/", get(list_clients))
        .route("/api/clients/{id}/", patch(patch_client))
        .route("/api/milestones/", get(list_milestones))
        .route("/api/auth/token/", post(obtain_token))
        .route("/api/documents/{id}/download/", get(download_document))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), backend)
}

/// Answers one request with a 401 whose body is cut off mid-stream.
async fn spawn_truncating_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 401 Unauthorized\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"code\":\"token_",
                )
                .await;
        }
    });
    format!("http://{}/api", addr)
}

struct RecordingNavigator {
    location: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn at(location: &str) -> Self {
        Self {
            location: Mutex::new(location.to_string()),
            visits: Mutex::new(Vec::new()),
        }
    }

    fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.location.lock().unwrap().clone()
    }

    fn navigate(&self, path: &str) {
        *self.location.lock().unwrap() = path.to_string();
        self.visits.lock().unwrap().push(path.to_string());
    }
}

fn client(
    base_url: &str,
    store: Arc<MemoryTokenStore>,
    redirect: Arc<LoginRedirect<RecordingNavigator>>,
) -> ApiClient {
    let listener: Arc<dyn SessionListener> = redirect;
    ApiClient::builder()
        .base_url(base_url)
        .token_store(store)
        .session_listener(listener)
        .build()
        .unwrap()
}

fn stored(token: &str) -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_session(&SessionData::new(
        token,
        Some("refresh-0".to_string()),
    )))
}

#[tokio::test]
async fn invalid_token_clears_session_and_redirects_once() {
    let (base_url, backend) = spawn_backend().await;
    let store = stored("abc123");
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/clients/"), "/login"));
    let api = client(&base_url, store.clone(), redirect.clone());

    let err = api.get::<Value>("/clients/").await.unwrap_err();

    // The caller still sees the failure
    assert!(err.is_session_invalidated(), "unexpected error: {err:?}");
    assert_eq!(backend.seen_auth(), vec![Some("Bearer abc123".to_string())]);
    assert!(store.access_token().unwrap().is_none());
    assert!(store.refresh_token().unwrap().is_none());
    assert_eq!(redirect.navigator().visits(), vec!["/login".to_string()]);
    assert_eq!(api.session_state(), SessionState::Anonymous);
}

#[tokio::test]
async fn invalid_token_on_login_page_does_not_redirect() {
    let (base_url, _backend) = spawn_backend().await;
    let store = stored("abc123");
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/login?next=/jobs/"), "/login"));
    let api = client(&base_url, store.clone(), redirect.clone());

    let err = api.get::<Value>("clients/").await.unwrap_err();

    assert!(err.is_session_invalidated());
    assert!(store.load_session().unwrap().is_none());
    assert!(redirect.navigator().visits().is_empty());
}

#[tokio::test]
async fn login_list_and_logout() {
    let (base_url, backend) = spawn_backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/login"), "/login"));
    let api = client(&base_url, store.clone(), redirect.clone());
    let auth = AuthProvider::new(api.clone());

    // Wrong password is a plain 401, not a session teardown
    let err = auth.login("dana", "hunter2").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)), "unexpected error: {err:?}");
    assert_eq!(auth.state(), SessionState::Anonymous);

    let session = auth.login(" dana ", "correct horse").await.unwrap();
    assert_eq!(session.access_token, VALID_TOKEN);
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(auth.state(), SessionState::Authenticated);

    let page = Resources::new(&api).list_page::<Client>(1).await.unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.results[1].display_name(), "Borealis Builders (Sam Ortiz)");

    auth.logout().unwrap();
    let err = api.get::<Value>("clients/").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));

    assert_eq!(
        backend.seen_auth(),
        vec![Some(format!("Bearer {}", VALID_TOKEN)), None]
    );
    assert!(redirect.navigator().visits().is_empty());
}

#[tokio::test]
async fn bad_credentials_keep_existing_session() {
    let (base_url, _backend) = spawn_backend().await;
    let store = stored("still-here");
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/settings"), "/login"));
    let api = client(&base_url, store.clone(), redirect.clone());

    let err = AuthProvider::new(api).login("dana", "wrong").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(store.access_token().unwrap().as_deref(), Some("still-here"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-0"));
    assert!(redirect.navigator().visits().is_empty());
}

#[tokio::test]
async fn network_failure_passes_through() {
    // Grab a free port and close it again so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = stored("abc123");
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/jobs/"), "/login"));
    let api = client(&format!("http://{}/api", addr), store.clone(), redirect.clone());

    let err = api.get::<Value>("clients/").await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)), "unexpected error: {err:?}");
    assert_eq!(store.access_token().unwrap().as_deref(), Some("abc123"));
    assert!(redirect.navigator().visits().is_empty());
}

#[tokio::test]
async fn update_sends_trimmed_payload() {
    let (base_url, _backend) = spawn_backend().await;
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/clients/7"), "/login"));
    let api = client(&base_url, stored(VALID_TOKEN), redirect);

    let updated: Client = Resources::new(&api)
        .update::<Client, _>(7, &json!({"name": "  Acme Ltd  ", "email": " "}))
        .await
        .unwrap();

    assert_eq!(updated.id, Some(7));
    assert_eq!(updated.name, "Acme Ltd");
    assert!(updated.email.is_none());
}

#[tokio::test]
async fn download_returns_raw_bytes() {
    let (base_url, _backend) = spawn_backend().await;
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/documents"), "/login"));
    let api = client(&base_url, stored(VALID_TOKEN), redirect);

    let bytes = Resources::new(&api).download_document(9).await.unwrap();
    assert_eq!(bytes, vec![9, 0xCA, 0xFE]);
}

#[tokio::test]
async fn milestones_for_job_reads_every_page() {
    let (base_url, backend) = spawn_backend().await;
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/jobs/5"), "/login"));
    let api = client(&base_url, stored(VALID_TOKEN), redirect);

    let milestones = Resources::new(&api).milestones_for_job(5).await.unwrap();

    let ids: Vec<i64> = milestones.iter().filter_map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);

    let queries = backend.seen_queries();
    assert_eq!(queries.len(), 2);
    assert!(queries.iter().all(|q| q.get("job").map(String::as_str) == Some("5")));
    assert_eq!(queries[1].get("page").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn unreadable_401_body_is_not_a_session_teardown() {
    let base_url = spawn_truncating_backend().await;
    let store = stored("abc123");
    let redirect = Arc::new(LoginRedirect::new(RecordingNavigator::at("/jobs/"), "/login"));
    let api = client(&base_url, store.clone(), redirect.clone());

    let err = api.get::<Value>("clients/").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)), "unexpected error: {err:?}");
    assert_eq!(store.access_token().unwrap().as_deref(), Some("abc123"));
    assert!(redirect.navigator().visits().is_empty());
}
