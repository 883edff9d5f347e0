//! Shared helpers for integration tests
//!
//! Each test gets a fresh embedded database in a temp directory and
//! drives requests through the full middleware stack via oneshot.

use axum::Router;
use axum::body::Body;
use http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use admin_server::api::build_app;
use admin_server::auth::{Capability, CapabilitySet};
use admin_server::core::{Config, ServerState};
use admin_server::db::models::{AdminCreate, RoleCreate};
use admin_server::db::repository::{AdminRepository, RoleRepository};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Fresh server state backed by a throwaway RocksDB directory
///
/// Keep the TempDir alive for the duration of the test.
pub async fn test_state() -> (ServerState, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("db");
    let config = Config::with_overrides(db_path.to_string_lossy().into_owned(), 0, TEST_SECRET);
    let state = ServerState::initialize(&config).await.unwrap();
    (state, tmp)
}

/// Full application with middleware, ready for oneshot calls
pub fn test_app(state: &ServerState) -> Router {
    build_app(state).with_state(state.clone())
}

/// Drive one request through the app and return the raw response
pub async fn send(state: &ServerState, req: Request<Body>) -> Response<Body> {
    test_app(state).oneshot(req).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

// ===== Request builders =====

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    request(http::Method::GET, path, token, None)
}

pub fn post_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(http::Method::POST, path, token, Some(body))
}

pub fn post_empty(path: &str, token: Option<&str>) -> Request<Body> {
    request(http::Method::POST, path, token, None)
}

pub fn put_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(http::Method::PUT, path, token, Some(body))
}

pub fn delete(path: &str, token: Option<&str>) -> Request<Body> {
    request(http::Method::DELETE, path, token, None)
}

fn request(
    method: http::Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// ===== Seeding =====

/// Create a role with the given capability grants plus an account bound
/// to it. Returns (admin record id, role record id).
pub async fn seed_admin_with_role(
    state: &ServerState,
    email: &str,
    password: &str,
    role_name: &str,
    grants: &[(Capability, bool)],
) -> (String, String) {
    let roles = RoleRepository::new(state.get_db());
    let capabilities: CapabilitySet = grants.iter().copied().collect();
    let role = roles
        .create(RoleCreate {
            name: role_name.to_string(),
            capabilities,
            is_super_admin: false,
        })
        .await
        .unwrap();
    let role_id = role.id.clone().unwrap();

    let admins = AdminRepository::new(state.get_db());
    let admin = admins
        .create(AdminCreate {
            email: email.to_string(),
            password: password.to_string(),
            display_name: None,
            role: Some(role_id.clone()),
        })
        .await
        .unwrap();

    (admin.id.unwrap().to_string(), role_id.to_string())
}

/// Log in through the API and return the bearer token
pub async fn login(state: &ServerState, email: &str, password: &str) -> String {
    let req = post_json(
        "/api/auth/login",
        None,
        serde_json::json!({"email": email, "password": password}),
    );
    let response = send(state, req).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    json["data"]["token"].as_str().unwrap().to_string()
}
