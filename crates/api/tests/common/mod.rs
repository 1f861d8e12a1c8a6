#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use abacus_api::auth::jwt::JwtConfig;
use abacus_api::config::ServerConfig;
use abacus_api::router::{build_app_router, build_dispatch_router};
use abacus_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        dispatch_port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

fn test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
    }
}

/// Build the public router exactly as `main.rs` does.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(test_state(pool), &test_config())
}

/// Build the dispatch router exactly as `main.rs` does.
pub fn build_test_dispatch(pool: PgPool) -> Router {
    build_dispatch_router(test_state(pool), &test_config())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<axum::body::Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::post(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

/// Register a user through the API and return a fresh access token.
pub async fn register_and_login(app: &Router, login: &str) -> String {
    let credentials = serde_json::json!({ "login": login, "password": "pa55word" });

    let response = post_json(app.clone(), "/api/v1/register", credentials.clone()).await;
    assert_eq!(response.status(), StatusCode::OK, "register {login}");

    let response = post_json(app.clone(), "/api/v1/login", credentials).await;
    assert_eq!(response.status(), StatusCode::OK, "login {login}");
    body_json(response).await["token"]
        .as_str()
        .expect("login response must carry a token")
        .to_string()
}

/// Submit an expression and return the response.
pub async fn calculate(app: &Router, token: &str, expression: &str) -> Response<Body> {
    post_json_auth(
        app.clone(),
        "/api/v1/calculate",
        serde_json::json!({ "expression": expression }),
        token,
    )
    .await
}
