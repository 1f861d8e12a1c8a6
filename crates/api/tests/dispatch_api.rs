//! Integration tests for the worker dispatch RPC surface.
//!
//! Drives the dispatch router the way a worker does: claim, compute,
//! report, and checks the chain and expression state that results.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::Router;
use common::{body_json, calculate, get_auth, post_empty, post_json};
use sqlx::PgPool;

use abacus_api::engine::dispatch::{self, ReportOutcome};
use abacus_api::error::AppError;
use abacus_core::dispatch::{TaskReport, WorkItem, CLAIM_PATH, REPORT_PATH};
use abacus_core::error::CoreError;
use abacus_db::models::status::TaskStatus;
use abacus_db::repositories::{ExpressionRepo, TaskRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn claim(rpc: &Router) -> Option<WorkItem> {
    let response = post_empty(rpc.clone(), CLAIM_PATH).await;
    match response.status() {
        StatusCode::OK => Some(serde_json::from_value(body_json(response).await).unwrap()),
        StatusCode::NOT_FOUND => None,
        other => panic!("unexpected claim status {other}"),
    }
}

async fn report(rpc: &Router, item: &WorkItem, result: f64) -> StatusCode {
    let body = serde_json::to_value(TaskReport::for_item(item, 5, result)).unwrap();
    post_json(rpc.clone(), REPORT_PATH, body).await.status()
}

/// Claim and report until nothing is ready; returns how many tasks ran.
async fn drain(rpc: &Router) -> usize {
    let mut processed = 0;
    while let Some(item) = claim(rpc).await {
        let result = item.operator.apply(item.arg1, item.arg2);
        assert_eq!(report(rpc, &item, result).await, StatusCode::OK);
        processed += 1;
    }
    processed
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claim_with_nothing_ready_is_not_found(pool: PgPool) {
    let rpc = common::build_test_dispatch(pool);

    let response = post_empty(rpc, CLAIM_PATH).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_chain_is_released_one_task_at_a_time(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool.clone());
    let token = common::register_and_login(&app, "alice").await;
    calculate(&app, &token, "1+2+3").await;

    let first = claim(&rpc).await.expect("first task must be ready");
    assert_eq!((first.login.as_str(), first.expression_id, first.task_id), ("alice", 1, 1));
    assert_eq!((first.arg1, first.arg2), (1.0, 2.0));

    // The successor waits for the first result.
    assert!(claim(&rpc).await.is_none());

    assert_eq!(report(&rpc, &first, 3.0).await, StatusCode::OK);

    let second = claim(&rpc).await.expect("second task must be released");
    assert_eq!(second.task_id, 2);
    assert_eq!((second.arg1, second.arg2), (3.0, 3.0));
}

// ---------------------------------------------------------------------------
// Full processing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_chain_produces_expression_result(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool.clone());
    let token = common::register_and_login(&app, "bob").await;
    calculate(&app, &token, "1+2-3*4/5").await;

    assert_eq!(drain(&rpc).await, 4);

    let tasks = TaskRepo::list_for_expression(&pool, "bob", 1).await.unwrap();
    assert!(tasks
        .iter()
        .all(|t| t.status() == Some(TaskStatus::Calculated)));
    assert!(tasks.iter().all(|t| t.elapsed_ms == Some(5)));

    let response = get_auth(app, "/api/v1/expressions/1", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["expression"]["status"], "calculated");
    let result = json["expression"]["result"].as_f64().unwrap();
    assert!((result - 0.6).abs() < 1e-9, "got {result}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_interleaved_expressions_all_finish(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool);
    let carol = common::register_and_login(&app, "carol").await;
    let dave = common::register_and_login(&app, "dave").await;

    calculate(&app, &carol, "2*(3+4)").await;
    calculate(&app, &dave, "10/4-1").await;
    calculate(&app, &carol, "1+(2-3)*4/5+(-2)").await;

    assert_eq!(drain(&rpc).await, 2 + 2 + 5);

    let expected = [(&carol, 1, 14.0), (&dave, 1, 1.5), (&carol, 2, -1.8)];
    for (token, id, value) in expected {
        let uri = format!("/api/v1/expressions/{id}");
        let json = body_json(get_auth(app.clone(), &uri, token).await).await;
        assert_eq!(json["expression"]["status"], "calculated");
        let result = json["expression"]["result"].as_f64().unwrap();
        assert!((result - value).abs() < 1e-9, "{uri}: got {result}, want {value}");
    }
}

// ---------------------------------------------------------------------------
// Duplicate and stale reports
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_report_is_rejected_without_advancing(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool.clone());
    let token = common::register_and_login(&app, "erin").await;
    calculate(&app, &token, "1+2+3+4").await;

    let first = claim(&rpc).await.unwrap();
    assert_eq!(report(&rpc, &first, 3.0).await, StatusCode::OK);

    let response = post_json(
        rpc.clone(),
        REPORT_PATH,
        serde_json::to_value(TaskReport::for_item(&first, 5, 999.0)).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    let tasks = TaskRepo::list_for_expression(&pool, "erin", 1).await.unwrap();
    assert_eq!(tasks[0].result, Some(3.0), "first report wins");
    assert_eq!(tasks[1].status(), Some(TaskStatus::Ready));
    assert_eq!(tasks[2].status(), Some(TaskStatus::NotReady));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_reports_advance_chain_once(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool.clone());
    let token = common::register_and_login(&app, "frank").await;
    calculate(&app, &token, "5*5").await;

    let item = claim(&rpc).await.unwrap();
    let report = TaskReport::for_item(&item, 5, 25.0);

    let (a, b) = tokio::join!(
        dispatch::report_result(&pool, &report),
        dispatch::report_result(&pool, &report),
    );
    let (won, lost) = if a.is_ok() { (a, b) } else { (b, a) };
    assert_matches!(won, Ok(ReportOutcome::Finalized));
    assert_matches!(lost, Err(AppError::Core(CoreError::Conflict(_))));

    let json = body_json(get_auth(app, "/api/v1/expressions/1", &token).await).await;
    assert_eq!(json["expression"]["result"], 25.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_final_report_keeps_an_already_calculated_expression(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool.clone());
    let token = common::register_and_login(&app, "grace").await;
    calculate(&app, &token, "6/3").await;

    let item = claim(&rpc).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    assert!(ExpressionRepo::finalize(&mut tx, "grace", 1, 7.0).await.unwrap());
    tx.commit().await.unwrap();

    let report = TaskReport::for_item(&item, 5, 2.0);
    assert_matches!(
        dispatch::report_result(&pool, &report).await,
        Ok(ReportOutcome::Finalized)
    );

    let json = body_json(get_auth(app, "/api/v1/expressions/1", &token).await).await;
    assert_eq!(json["expression"]["status"], "calculated");
    assert_eq!(json["expression"]["result"], 7.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_report_for_unclaimed_task_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool);
    let token = common::register_and_login(&app, "gina").await;
    calculate(&app, &token, "8/2").await;

    let never_claimed = WorkItem {
        login: "gina".into(),
        expression_id: 1,
        task_id: 1,
        arg1: 8.0,
        arg2: 2.0,
        operator: abacus_core::operator::Operator::Divide,
    };
    assert_eq!(report(&rpc, &never_claimed, 4.0).await, StatusCode::CONFLICT);

    // The task is still claimable.
    assert!(claim(&rpc).await.is_some());
}

// ---------------------------------------------------------------------------
// Startup recovery
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recovery_requeues_lost_work(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let rpc = common::build_test_dispatch(pool.clone());
    let token = common::register_and_login(&app, "hank").await;
    calculate(&app, &token, "7-2").await;

    let lost = claim(&rpc).await.unwrap();
    assert!(claim(&rpc).await.is_none());

    assert_eq!(dispatch::recover(&pool).await.unwrap(), 1);

    let again = claim(&rpc).await.expect("requeued task must be claimable");
    assert_eq!(again, lost);
    assert_eq!(report(&rpc, &again, 5.0).await, StatusCode::OK);

    let json = body_json(get_auth(app, "/api/v1/expressions/1", &token).await).await;
    assert_eq!(json["expression"]["result"], 5.0);
}
