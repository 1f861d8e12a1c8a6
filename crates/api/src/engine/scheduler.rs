//! Submission path: compile an expression and persist its chain.

use abacus_core::error::CoreError;
use abacus_core::expression::compile;
use abacus_core::types::DbId;
use abacus_db::repositories::{ExpressionRepo, TaskRepo, UserRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Compile `text` and persist it for `login` as one atomic submission.
///
/// Compilation runs before anything is written, so a rejected expression
/// leaves no rows behind and does not advance the user's counter. The
/// counter bump, the chain and the expression row commit together; if any
/// write fails the transaction is dropped and rolled back.
///
/// Returns the new per-user expression id.
pub async fn submit(pool: &PgPool, login: &str, text: &str) -> AppResult<DbId> {
    let chain = compile(text)?;

    let mut tx = pool.begin().await?;

    let expression_id = UserRepo::next_expression_id(&mut tx, login)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    TaskRepo::insert_chain(&mut tx, login, expression_id, &chain.tasks).await?;
    ExpressionRepo::insert(&mut tx, login, expression_id, &chain.normalized).await?;

    tx.commit().await?;

    tracing::info!(
        login = %login,
        expression_id,
        tasks = chain.tasks.len(),
        expression = %chain.normalized,
        "Expression submitted",
    );

    Ok(expression_id)
}
