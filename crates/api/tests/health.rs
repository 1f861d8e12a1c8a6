mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_on_both_listeners(pool: PgPool) {
    for app in [
        common::build_test_app(pool.clone()),
        common::build_test_dispatch(pool.clone()),
    ] {
        let response = get(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dispatch_routes_are_not_on_public_listener(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = common::post_empty(app, abacus_core::dispatch::CLAIM_PATH).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
