pub mod auth;
pub mod dispatch;
pub mod expressions;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /register              register (public)
/// /login                 login (public)
///
/// /calculate             submit an expression (auth required)
/// /expressions           list the caller's expressions (auth required)
/// /expressions/{id}      one expression (auth required)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(expressions::router())
}
