//! Handlers for the worker dispatch RPC surface.

use abacus_core::dispatch::{ReportAck, TaskReport};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::engine::dispatch;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::state::AppState;

/// POST /rpc/v1/tasks/claim
///
/// `200` with a work item, or `404` when nothing is ready.
pub async fn claim(State(state): State<AppState>) -> AppResult<Response> {
    match dispatch::get_work(&state.pool).await? {
        Some(item) => Ok(Json(item).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "No task is ready",
                "code": "NOT_FOUND",
            })),
        )
            .into_response()),
    }
}

/// POST /rpc/v1/tasks/report
pub async fn report(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<TaskReport>,
) -> AppResult<Json<ReportAck>> {
    dispatch::report_result(&state.pool, &input).await?;
    Ok(Json(ReportAck::default()))
}
