//! End-to-end authentication flow tests against the full router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use oxcart_auth::config::AuthConfig;
use oxcart_auth::password::hash_password;
use oxcart_auth::session::SessionManager;
use oxcart_auth::storage::{
    BlacklistStore, MemoryBlacklistStore, MemoryRefreshTokenStore, MemoryUserStore,
    RefreshTokenStore, UserStore,
};
use oxcart_auth::token::{TokenClaims, TokenCodec};
use oxcart_core::{Role, User};
use oxcart_server::config::AppConfig;
use oxcart_server::server::build_app;
use oxcart_server::state::AppState;

const SECRET: &str = "integration-secret-at-least-32-bytes-long";

fn test_config() -> AppConfig {
    AppConfig {
        auth: AuthConfig::default().with_signing_secret(SECRET),
        ..AppConfig::default()
    }
}

struct TestServer {
    app: Router,
    users: Arc<MemoryUserStore>,
    codec: Arc<TokenCodec>,
}

fn test_server() -> TestServer {
    let cfg = test_config();
    let codec = Arc::new(TokenCodec::from_config(&cfg.auth));
    let users = Arc::new(MemoryUserStore::new());
    let sessions = Arc::new(SessionManager::new(
        Arc::clone(&codec),
        Arc::new(MemoryRefreshTokenStore::new()) as Arc<dyn RefreshTokenStore>,
        Arc::new(MemoryBlacklistStore::new()) as Arc<dyn BlacklistStore>,
        Arc::clone(&users) as Arc<dyn UserStore>,
        Duration::from_secs(30 * 24 * 3600),
    ));
    let state = AppState::new(sessions, cfg.auth.exempt_paths.clone());
    TestServer {
        app: build_app(&cfg, state),
        users,
        codec,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn post_json_authed(
    app: &Router,
    path: &str,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get_authed(app: &Router, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn register(app: &Router, email: &str) -> Value {
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        json!({ "email": email, "name": "Test User", "password": "correct-horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn register_returns_tokens_and_profile() {
    let server = test_server();
    let body = register(&server.app, "alice@example.com").await;

    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 900);
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "CUSTOMER");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected_with_400() {
    let server = test_server();
    register(&server.app, "alice@example.com").await;

    let (status, body) = post_json(
        &server.app,
        "/api/auth/register",
        json!({ "email": "alice@example.com", "name": "Alice Again", "password": "correct-horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn register_validates_fields() {
    let server = test_server();
    for bad in [
        json!({ "email": "not-an-email", "name": "A", "password": "correct-horse" }),
        json!({ "email": "a@example.com", "name": "", "password": "correct-horse" }),
        json!({ "email": "a@example.com", "name": "A", "password": "short" }),
    ] {
        let (status, _) = post_json(&server.app, "/api/auth/register", bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn login_succeeds_with_correct_credentials() {
    let server = test_server();
    register(&server.app, "alice@example.com").await;

    let (status, body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "email": "alice@example.com", "password": "correct-horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresIn"], 900);
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let server = test_server();
    register(&server.app, "alice@example.com").await;

    let (wrong_pw_status, wrong_pw_body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "email": "alice@example.com", "password": "wrong-password" }),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "email": "nobody@example.com", "password": "correct-horse" }),
    )
    .await;

    // Same status, same body: no account enumeration.
    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body);
    assert_eq!(wrong_pw_body["status"], 401);
}

#[tokio::test]
async fn me_requires_and_honors_bearer() {
    let server = test_server();
    let tokens = register(&server.app, "alice@example.com").await;
    let access = tokens["accessToken"].as_str().unwrap();

    let (status, body) = get_authed(&server.app, "/api/users/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, _) = get_authed(&server.app, "/api/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_bearer_yields_401_not_500() {
    let server = test_server();
    register(&server.app, "alice@example.com").await;
    let user = server
        .users
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    let now = time::OffsetDateTime::now_utc();
    let claims = TokenClaims::access(
        &user,
        now - time::Duration::hours(2),
        now - time::Duration::hours(1),
    );
    let expired = server.codec.encode(&claims).unwrap();

    let (status, body) = get_authed(&server.app, "/api/users/me", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn refresh_mints_new_access_and_keeps_refresh() {
    let server = test_server();
    let tokens = register(&server.app, "alice@example.com").await;
    let refresh = tokens["refreshToken"].as_str().unwrap();

    let (status, body) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refreshToken"], refresh);
    assert!(body["accessToken"].is_string());
    // No profile on refresh responses.
    assert!(body.get("user").is_none());

    // The new access token authenticates.
    let access = body["accessToken"].as_str().unwrap();
    let (status, _) = get_authed(&server.app, "/api/users/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_blank_and_invalid_tokens() {
    let server = test_server();

    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refreshToken": "  " }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refreshToken": "not.a.token" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn refresh_fails_closed_for_deleted_user() {
    let server = test_server();
    let tokens = register(&server.app, "alice@example.com").await;
    let refresh = tokens["refreshToken"].as_str().unwrap();

    let user = server
        .users
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    server.users.remove(user.id).await;

    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_access_and_refresh() {
    let server = test_server();
    let tokens = register(&server.app, "alice@example.com").await;
    let access = tokens["accessToken"].as_str().unwrap();
    let refresh = tokens["refreshToken"].as_str().unwrap();

    let (status, body) = post_json_authed(
        &server.app,
        "/api/auth/logout",
        access,
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    // Blacklisted access token no longer authenticates, despite being
    // unexpired and correctly signed.
    let (status, _) = get_authed(&server.app, "/api/users/me", Some(access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Revoked refresh token no longer mints.
    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_refresh_token_still_succeeds() {
    let server = test_server();
    let tokens = register(&server.app, "alice@example.com").await;
    let access = tokens["accessToken"].as_str().unwrap();
    let refresh = tokens["refreshToken"].as_str().unwrap();

    let (status, _) = post_json_authed(&server.app, "/api/auth/logout", access, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    // Refresh lifeline survives; only the access token died.
    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_with_no_credentials_is_still_200() {
    let server = test_server();
    let (status, _) = post_json(&server.app, "/api/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_revoke_endpoint_enforces_authority() {
    let server = test_server();

    // Admin account created directly in the store; registration only
    // produces customers.
    let admin = User::new(
        "ops@example.com",
        "Ops",
        hash_password("admin-password").unwrap(),
        Role::Admin,
    );
    server.users.create(&admin).await.unwrap();

    let customer_tokens = register(&server.app, "alice@example.com").await;
    let customer_access = customer_tokens["accessToken"].as_str().unwrap();
    let customer = server
        .users
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    let (_, admin_login) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "email": "ops@example.com", "password": "admin-password" }),
    )
    .await;
    let admin_access = admin_login["accessToken"].as_str().unwrap();

    // Customer cannot bulk-revoke.
    let path = format!("/api/admin/users/{}/revoke-tokens", customer.id);
    let (status, _) = post_json_authed(&server.app, &path, customer_access, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin can; one session issued at registration.
    let (status, body) = post_json_authed(&server.app, &path, admin_access, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    // Customer's refresh token is now dead.
    let refresh = customer_tokens["refreshToken"].as_str().unwrap();
    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown target user is a 404.
    let path = format!("/api/admin/users/{}/revoke-tokens", uuid::Uuid::new_v4());
    let (status, _) = post_json_authed(&server.app, &path, admin_access, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoints_answer_without_auth() {
    let server = test_server();

    let (status, body) = get_authed(&server.app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_authed(&server.app, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let server = test_server();

    // Generated when absent.
    let response = server
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    // Echoed when supplied.
    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-12345");
}
