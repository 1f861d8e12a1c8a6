//! Route definitions for the worker dispatch RPC.

use abacus_core::dispatch::{CLAIM_PATH, REPORT_PATH};
use axum::routing::post;
use axum::Router;

use crate::handlers::dispatch;
use crate::state::AppState;

/// Routes served on the dispatch listener.
///
/// ```text
/// POST /rpc/v1/tasks/claim   -> claim
/// POST /rpc/v1/tasks/report  -> report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(CLAIM_PATH, post(dispatch::claim))
        .route(REPORT_PATH, post(dispatch::report))
}
