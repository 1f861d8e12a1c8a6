//! Handlers for registration and login.

use abacus_core::error::CoreError;
use abacus_db::models::user::CreateUser;
use abacus_db::repositories::UserRepo;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for both `POST /register` and `POST /login`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/register
///
/// Create an account with an empty expression history. A login that is
/// already taken is rejected with `409` by the `uq_users_login` constraint.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Credentials>,
) -> AppResult<Json<serde_json::Value>> {
    if input.login.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Login and password must not be empty".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            login: input.login,
            password_hash,
        },
    )
    .await?;

    tracing::info!(login = %user.login, "User registered");

    Ok(Json(serde_json::json!({})))
}

/// POST /api/v1/login
///
/// Verify credentials and return a signed access token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Credentials>,
) -> AppResult<Json<TokenResponse>> {
    let user = UserRepo::find_by_login(&state.pool, &input.login)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid login or password".into()))
        })?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        tracing::warn!(login = %user.login, "Failed login attempt");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid login or password".into(),
        )));
    }

    let token = generate_access_token(&user.login, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(login = %user.login, "User logged in");

    Ok(Json(TokenResponse { token }))
}
