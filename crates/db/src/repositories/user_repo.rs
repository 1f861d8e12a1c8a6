//! Repository for the `users` table.

use abacus_core::types::DbId;
use sqlx::PgPool;

use super::Tx;
use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, login, password_hash, expression_count, created_at, updated_at";

/// Provides user lookups and the per-user expression counter.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user with a zero expression counter.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (login, password_hash) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.login)
            .bind(&input.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Find a user by login (case-sensitive).
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE login = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(pool)
            .await
    }

    /// Return `true` if a user with this login exists.
    pub async fn exists(pool: &PgPool, login: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE login = $1)")
            .bind(login)
            .fetch_one(pool)
            .await
    }

    /// Increment the user's expression counter and return the new value,
    /// which is the id of the expression being created.
    ///
    /// The row stays locked until the surrounding transaction ends, so
    /// concurrent submissions by the same user are serialized. Returns `None`
    /// if the user does not exist.
    pub async fn next_expression_id(
        tx: &mut Tx<'_>,
        login: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "UPDATE users \
             SET expression_count = expression_count + 1, updated_at = NOW() \
             WHERE login = $1 \
             RETURNING expression_count",
        )
        .bind(login)
        .fetch_optional(&mut **tx)
        .await
    }
}
