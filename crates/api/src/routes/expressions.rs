//! Route definitions for expressions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::expressions;
use crate::state::AppState;

/// Routes mounted at `/api/v1`. All require authentication.
///
/// ```text
/// POST /calculate         -> calculate
/// GET  /expressions       -> list
/// GET  /expressions/{id}  -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calculate", post(expressions::calculate))
        .route("/expressions", get(expressions::list))
        .route("/expressions/{id}", get(expressions::get_by_id))
}
