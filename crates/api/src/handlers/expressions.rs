//! Handlers for submitting and reading a user's expressions.

use abacus_core::error::CoreError;
use abacus_core::types::DbId;
use abacus_db::models::expression::ExpressionView;
use abacus_db::repositories::ExpressionRepo;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::engine::scheduler;
use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /calculate`.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

/// Response body for `POST /calculate`.
#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub id: DbId,
}

#[derive(Debug, Serialize)]
pub struct ExpressionList {
    pub expressions: Vec<ExpressionView>,
}

#[derive(Debug, Serialize)]
pub struct ExpressionEnvelope {
    pub expression: ExpressionView,
}

/// POST /api/v1/calculate
pub async fn calculate(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CalculateRequest>,
) -> AppResult<(StatusCode, Json<CalculateResponse>)> {
    let id = scheduler::submit(&state.pool, &user.login, &input.expression).await?;
    Ok((StatusCode::CREATED, Json(CalculateResponse { id })))
}

/// GET /api/v1/expressions
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ExpressionList>> {
    let expressions = ExpressionRepo::list_by_login(&state.pool, &user.login)
        .await?
        .into_iter()
        .map(ExpressionView::from)
        .collect();
    Ok(Json(ExpressionList { expressions }))
}

/// GET /api/v1/expressions/{id}
///
/// Another user's id is indistinguishable from a missing one.
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ExpressionEnvelope>> {
    let expression = ExpressionRepo::find(&state.pool, &user.login, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Expression",
            id,
        }))?;
    Ok(Json(ExpressionEnvelope {
        expression: expression.into(),
    }))
}
