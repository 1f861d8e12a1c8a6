//! Repository for the `expressions` table.

use abacus_core::types::DbId;
use sqlx::PgPool;

use super::Tx;
use crate::models::expression::Expression;
use crate::models::status::ExpressionStatus;

/// Column list for `expressions` queries.
const COLUMNS: &str = "id, login, expression_id, expression, status_id, result, \
                       created_at, updated_at";

/// Provides persistence for submitted expressions.
pub struct ExpressionRepo;

impl ExpressionRepo {
    /// Insert a new expression in `NotCalculated` status with no result.
    pub async fn insert(
        tx: &mut Tx<'_>,
        login: &str,
        expression_id: DbId,
        text: &str,
    ) -> Result<Expression, sqlx::Error> {
        let query = format!(
            "INSERT INTO expressions (login, expression_id, expression, status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Expression>(&query)
            .bind(login)
            .bind(expression_id)
            .bind(text)
            .bind(ExpressionStatus::NotCalculated.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark an expression calculated with its final result.
    ///
    /// Returns `false` if the expression was already calculated or does
    /// not exist.
    pub async fn finalize(
        tx: &mut Tx<'_>,
        login: &str,
        expression_id: DbId,
        result: f64,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE expressions \
             SET status_id = $3, result = $4, updated_at = NOW() \
             WHERE login = $1 AND expression_id = $2 AND status_id = $5",
        )
        .bind(login)
        .bind(expression_id)
        .bind(ExpressionStatus::Calculated.id())
        .bind(result)
        .bind(ExpressionStatus::NotCalculated.id())
        .execute(&mut **tx)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Find one of a user's expressions by its per-user id.
    pub async fn find(
        pool: &PgPool,
        login: &str,
        expression_id: DbId,
    ) -> Result<Option<Expression>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM expressions WHERE login = $1 AND expression_id = $2"
        );
        sqlx::query_as::<_, Expression>(&query)
            .bind(login)
            .bind(expression_id)
            .fetch_optional(pool)
            .await
    }

    /// List all of a user's expressions in submission order.
    pub async fn list_by_login(pool: &PgPool, login: &str) -> Result<Vec<Expression>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM expressions WHERE login = $1 ORDER BY expression_id"
        );
        sqlx::query_as::<_, Expression>(&query)
            .bind(login)
            .fetch_all(pool)
            .await
    }
}
