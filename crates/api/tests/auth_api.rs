//! HTTP-level integration tests for registration, login and the auth
//! extractor.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json};
use sqlx::PgPool;

use abacus_api::auth::jwt::generate_access_token;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_then_login_returns_token(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = common::register_and_login(&app, "alice").await;
    assert!(!token.is_empty());

    let user = abacus_db::repositories::UserRepo::find_by_login(&pool, "alice")
        .await
        .unwrap()
        .expect("registered user must exist");
    assert_eq!(user.expression_count, 0);
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_registration_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "login": "bob", "password": "secret" });

    let first = post_json(app.clone(), "/api/v1/register", body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_json(app, "/api/v1/register", body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_empty_credentials(pool: PgPool) {
    let app = common::build_test_app(pool);

    for body in [
        serde_json::json!({ "login": "", "password": "secret" }),
        serde_json::json!({ "login": "carol", "password": "" }),
    ] {
        let response = post_json(app.clone(), "/api/v1/register", body).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_with_wrong_password_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    common::register_and_login(&app, "dave").await;

    let response = post_json(
        app.clone(),
        "/api/v1/login",
        serde_json::json!({ "login": "dave", "password": "nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        app,
        "/api/v1/login",
        serde_json::json!({ "login": "nobody", "password": "nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_protected_routes_require_bearer_token(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.clone(), "/api/v1/expressions").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/v1/expressions", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_valid_token_for_unknown_user_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = generate_access_token("ghost", &common::test_config().jwt).unwrap();

    let response = get_auth(app, "/api/v1/expressions", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
