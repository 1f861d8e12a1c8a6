//! Repository for the `tasks` table: the shared work queue.
//!
//! Status transitions all go through [`TaskStatus`]. Every transition that
//! other writers may race on is a single conditional `UPDATE`, so a row only
//! changes state if it is still in the state the caller expects.

use abacus_core::expression::ChainTask;
use abacus_core::types::DbId;
use sqlx::PgPool;

use super::Tx;
use crate::models::status::TaskStatus;
use crate::models::task::{Task, TaskKey};

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, login, expression_id, task_id, arg1, arg2, operation, status_id, \
    elapsed_ms, result, claimed_at, completed_at, created_at, updated_at";

/// Provides queue operations over task rows.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a whole chain for one expression, in task-id order.
    ///
    /// The first task starts `Ready`; every later task starts `NotReady`
    /// and is released by [`TaskRepo::release`] when its predecessor
    /// completes.
    pub async fn insert_chain(
        tx: &mut Tx<'_>,
        login: &str,
        expression_id: DbId,
        chain: &[ChainTask],
    ) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for (index, task) in chain.iter().enumerate() {
            let status = if index == 0 {
                TaskStatus::Ready
            } else {
                TaskStatus::NotReady
            };
            let outcome = sqlx::query(
                "INSERT INTO tasks \
                     (login, expression_id, task_id, arg1, arg2, operation, status_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(login)
            .bind(expression_id)
            .bind(task.task_id)
            .bind(task.arg1)
            .bind(task.arg2)
            .bind(task.operator.symbol())
            .bind(status.id())
            .execute(&mut **tx)
            .await?;
            inserted += outcome.rows_affected();
        }
        Ok(inserted)
    }

    /// Atomically claim the oldest `Ready` task and mark it `InProgress`.
    ///
    /// Select and update happen in one statement with
    /// `FOR UPDATE SKIP LOCKED`, so concurrent callers from any number of
    /// processes never receive the same row. Returns `None` when nothing is
    /// ready.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET status_id = $1, claimed_at = NOW(), updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE status_id = $2 \
                 ORDER BY id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(TaskStatus::InProgress.id())
            .bind(TaskStatus::Ready.id())
            .fetch_optional(pool)
            .await
    }

    /// Record a result for an `InProgress` task and mark it `Calculated`.
    ///
    /// Returns `false` without changing anything if the task is not
    /// currently in progress (already reported, reset, or unknown).
    pub async fn complete(
        tx: &mut Tx<'_>,
        key: TaskKey<'_>,
        elapsed_ms: i64,
        result: f64,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE tasks \
             SET status_id = $4, elapsed_ms = $5, result = $6, \
                 completed_at = NOW(), updated_at = NOW() \
             WHERE login = $1 AND expression_id = $2 AND task_id = $3 AND status_id = $7",
        )
        .bind(key.login)
        .bind(key.expression_id)
        .bind(key.task_id)
        .bind(TaskStatus::Calculated.id())
        .bind(elapsed_ms)
        .bind(result)
        .bind(TaskStatus::InProgress.id())
        .execute(&mut **tx)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Release a `NotReady` task so it can be claimed.
    ///
    /// Returns `false` if no such waiting task exists, which for the
    /// successor of a just-completed task means the chain is finished.
    pub async fn release(tx: &mut Tx<'_>, key: TaskKey<'_>) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE tasks \
             SET status_id = $4, updated_at = NOW() \
             WHERE login = $1 AND expression_id = $2 AND task_id = $3 AND status_id = $5",
        )
        .bind(key.login)
        .bind(key.expression_id)
        .bind(key.task_id)
        .bind(TaskStatus::Ready.id())
        .bind(TaskStatus::NotReady.id())
        .execute(&mut **tx)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Put every `InProgress` task back to `Ready`.
    ///
    /// Run once at dispatch-service startup: work handed out before a
    /// restart is assumed lost and is recomputed.
    pub async fn reset_in_progress(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE tasks \
             SET status_id = $1, claimed_at = NULL, updated_at = NOW() \
             WHERE status_id = $2",
        )
        .bind(TaskStatus::Ready.id())
        .bind(TaskStatus::InProgress.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected())
    }

    /// Find a single task by its natural key.
    pub async fn find(pool: &PgPool, key: TaskKey<'_>) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE login = $1 AND expression_id = $2 AND task_id = $3"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(key.login)
            .bind(key.expression_id)
            .bind(key.task_id)
            .fetch_optional(pool)
            .await
    }

    /// List an expression's chain in task-id order.
    pub async fn list_for_expression(
        pool: &PgPool,
        login: &str,
        expression_id: DbId,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE login = $1 AND expression_id = $2 \
             ORDER BY task_id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(login)
            .bind(expression_id)
            .fetch_all(pool)
            .await
    }
}
