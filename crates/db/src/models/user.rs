//! User rows. Owned by the authentication layer.

use abacus_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Highest expression id issued to this user.
    pub expression_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a user. The password is already hashed.
#[derive(Debug)]
pub struct CreateUser {
    pub login: String,
    pub password_hash: String,
}
