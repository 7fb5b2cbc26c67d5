//! Mock API tests for the authenticated client.
//!
//! These tests use wiremock to simulate the admin backend and exercise the
//! full stack (session manager, pipeline, reqwest transport) without
//! network access.

use std::sync::Arc;
use std::time::Duration;

use backoffice_core::{
    AccessToken, ApiRequest, ApiUrl, AuthedClient, CancellationToken, CredentialStore,
    Credentials, Error, MemoryStore, Pagination, RefreshToken, Resource, SessionManager,
    SessionState, UserIdentity,
};
use backoffice_http::{HttpBackend, HttpConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create an API URL from a mock server.
fn mock_api_url(server: &MockServer) -> ApiUrl {
    ApiUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(mock_api_url(server)).unwrap()
}

fn session_store(access: &str, refresh: &str) -> Arc<dyn CredentialStore> {
    let user = UserIdentity::new(json!({"email": "admin@example.com", "role": "Admin"}));
    Arc::new(
        MemoryStore::with_session(
            Some(&user),
            &AccessToken::new(access),
            &RefreshToken::new(refresh),
        )
        .unwrap(),
    )
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "statusCode": 401,
        "message": "Unauthorized"
    }))
}

// ============================================================================
// Login / Logout
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/admin/login"))
        .and(body_json(json!({
            "email": "admin@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "user": {"id": "u1", "email": "admin@example.com", "role": "Admin", "nickname": "root"},
                "accessToken": "test-access-token",
                "refreshToken": "test-refresh-token"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    let session = SessionManager::restore(AuthedClient::new(backend(&server), Arc::clone(&store)));

    let user = session
        .login(&Credentials::new("admin@example.com", "secret123"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.nickname(), Some("root"));
    assert_eq!(session.state(), SessionState::LoggedIn);
    assert_eq!(store.access_token().unwrap().as_str(), "test-access-token");
    assert_eq!(store.refresh_token().unwrap().as_str(), "test-refresh-token");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/admin/login"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    let session = SessionManager::restore(AuthedClient::new(backend(&server), Arc::clone(&store)));

    let result = session
        .login(&Credentials::new("admin@example.com", "wrongpass"))
        .await;

    assert!(result.is_err());
    assert_eq!(session.state(), SessionState::LoggedOut);
    assert!(store.snapshot().is_empty());
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn test_logout_invalidates_backend_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = session_store("A1", "R1");
    let session = SessionManager::restore(AuthedClient::new(backend(&server), Arc::clone(&store)));
    assert_eq!(session.state(), SessionState::LoggedIn);

    session.logout().await;

    assert_eq!(session.state(), SessionState::LoggedOut);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_logout_clears_locally_when_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = HttpConfig {
        timeout: Duration::from_millis(200),
        ..HttpConfig::default()
    };
    let backend = HttpBackend::with_config(mock_api_url(&server), config).unwrap();
    let store = session_store("A1", "R1");
    let session = SessionManager::restore(AuthedClient::new(backend, Arc::clone(&store)));

    session.logout().await;

    assert_eq!(session.state(), SessionState::LoggedOut);
    assert!(store.snapshot().is_empty());
    assert!(store.user().is_none());
}

#[tokio::test]
async fn test_logout_clears_locally_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = session_store("A1", "R1");
    let session = SessionManager::restore(AuthedClient::new(backend(&server), Arc::clone(&store)));

    session.logout().await;

    assert_eq!(session.state(), SessionState::LoggedOut);
    assert!(store.snapshot().is_empty());
}

// ============================================================================
// Authorization Header
// ============================================================================

#[tokio::test]
async fn test_bearer_header_attached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(query_param("page", "1"))
        .and(query_param("take", "10"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"items": [{"id": "u1"}], "total": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), session_store("A1", "R1"));
    let response = client
        .send(&Resource::Users.list(Pagination::default()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.data()["total"], 1);
}

#[tokio::test]
async fn test_no_header_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), Arc::new(MemoryStore::new()));
    client.send(&ApiRequest::get("/admin/orders")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

// ============================================================================
// Refresh And Retry
// ============================================================================

#[tokio::test]
async fn test_expired_token_refreshed_and_replayed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(header("authorization", "Bearer R1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"access_token": "A2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"items": [], "total": 0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = session_store("A1", "R1");
    let client = AuthedClient::new(backend(&server), Arc::clone(&store));

    let response = client.send(&ApiRequest::get("/admin/users")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data()["total"], 0);
    assert_eq!(store.access_token().unwrap().as_str(), "A2");
    assert_eq!(store.refresh_token().unwrap().as_str(), "R1");
}

#[tokio::test]
async fn test_replay_preserves_method_body_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/admin/news/12"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"access_token": "A2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/admin/news/12"))
        .and(query_param("notify", "false"))
        .and(header("authorization", "Bearer A2"))
        .and(body_json(json!({"title": "Spring term"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 12}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), session_store("A1", "R1"));
    let request = Resource::News
        .update("12", json!({"title": "Spring term"}))
        .unwrap()
        .with_query("notify", false);

    let response = client.send(&request).await.unwrap();
    assert_eq!(response.data()["id"], 12);
}

#[tokio::test]
async fn test_refresh_failure_surfaces_reauthentication() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/events"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "statusCode": 401,
            "message": "Refresh token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = session_store("A1", "R1");
    let client = AuthedClient::new(backend(&server), Arc::clone(&store));

    let err = client
        .send(&ApiRequest::get("/admin/events"))
        .await
        .unwrap_err();

    assert!(err.is_reauthentication_required());
    assert!(err.to_string().contains("Refresh token expired"));
    // The pipeline alone leaves the session for the caller to end.
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn test_refreshed_token_rejected_again_stops() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/courses"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"access_token": "A2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), session_store("A1", "R1"));

    let err = client
        .send(&ApiRequest::get("/admin/courses"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_session_expires_when_refresh_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let store = session_store("A1", "R1");
    let session = SessionManager::restore(AuthedClient::new(backend(&server), Arc::clone(&store)));

    let err = session
        .send(&ApiRequest::get("/admin/orders"))
        .await
        .unwrap_err();

    assert!(err.is_reauthentication_required());
    assert_eq!(session.state(), SessionState::LoggedOut);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_concurrent_expiry_refreshes_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"access_token": "A2"}}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(2)
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), session_store("A1", "R1"));
    let request = ApiRequest::get("/admin/users");

    let (first, second) = tokio::join!(client.send(&request), client.send(&request));
    assert!(first.is_ok());
    assert!(second.is_ok());
}

// ============================================================================
// Cancellation And Transport Errors
// ============================================================================

#[tokio::test]
async fn test_cancelled_request_never_refreshes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/news"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"access_token": "A2"}
        })))
        .expect(0)
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), session_store("A1", "R1"));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client
        .send_cancellable(&ApiRequest::get("/admin/news"), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_timeout_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/events"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = HttpConfig {
        timeout: Duration::from_millis(200),
        ..HttpConfig::default()
    };
    let backend = HttpBackend::with_config(mock_api_url(&server), config).unwrap();
    let client = AuthedClient::new(backend, session_store("A1", "R1"));

    let err = client
        .send(&ApiRequest::get("/admin/events"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_non_json_error_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/courses/3"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("Internal Server Error")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), session_store("A1", "R1"));
    let err = client
        .send(&Resource::Courses.get("3").unwrap())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_empty_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/admin/student-says/9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = AuthedClient::new(backend(&server), session_store("A1", "R1"));
    let response = client
        .send(&Resource::StudentSays.delete("9").unwrap())
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert!(response.body.is_null());
}
