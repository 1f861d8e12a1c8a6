//! Dispatch operations behind the worker RPC surface.
//!
//! Task state lives entirely in the database. Claims use
//! [`TaskRepo::claim_next`], a single `FOR UPDATE SKIP LOCKED` statement,
//! so any number of worker processes can poll concurrently without
//! receiving the same task. Reports only transition rows that are still
//! in progress, which makes a duplicate report a no-op.

use abacus_core::dispatch::{TaskReport, WorkItem};
use abacus_core::error::CoreError;
use abacus_db::models::task::TaskKey;
use abacus_db::repositories::{ExpressionRepo, TaskRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// What a successful report did to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The next task in the chain is now ready.
    Advanced,
    /// The reported task was the last one; the expression is calculated.
    Finalized,
}

/// Claim the oldest ready task and mark it in progress.
///
/// Returns `None` when no task is ready. That is the normal idle answer,
/// not a failure.
pub async fn get_work(pool: &PgPool) -> AppResult<Option<WorkItem>> {
    let Some(task) = TaskRepo::claim_next(pool).await? else {
        return Ok(None);
    };

    tracing::debug!(
        login = %task.login,
        expression_id = task.expression_id,
        task_id = task.task_id,
        operation = %task.operation,
        "Task claimed",
    );

    Ok(Some(task.into_work_item()?))
}

/// Record a worker's result and advance the chain in one transaction.
///
/// 1. Mark the task calculated, but only if it is still in progress.
/// 2. Release the successor task.
/// 3. If there is no successor, mark the expression calculated with this
///    result.
///
/// A report for a task that is not in progress returns `Conflict` and
/// changes nothing.
pub async fn report_result(pool: &PgPool, report: &TaskReport) -> AppResult<ReportOutcome> {
    let key = TaskKey {
        login: &report.login,
        expression_id: report.expression_id,
        task_id: report.task_id,
    };

    let mut tx = pool.begin().await?;

    if !TaskRepo::complete(&mut tx, key, report.elapsed_ms, report.result).await? {
        tracing::warn!(
            login = %report.login,
            expression_id = report.expression_id,
            task_id = report.task_id,
            "Report for a task that is not in progress",
        );
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Task {} of expression {} is not in progress",
            report.task_id, report.expression_id
        ))));
    }

    let outcome = if TaskRepo::release(&mut tx, key.successor()).await? {
        ReportOutcome::Advanced
    } else {
        let finalized =
            ExpressionRepo::finalize(&mut tx, &report.login, report.expression_id, report.result)
                .await?;
        if !finalized {
            tracing::warn!(
                login = %report.login,
                expression_id = report.expression_id,
                task_id = report.task_id,
                "Chain finished but its expression was missing or already calculated",
            );
        }
        ReportOutcome::Finalized
    };

    tx.commit().await?;

    match outcome {
        ReportOutcome::Advanced => tracing::debug!(
            login = %report.login,
            expression_id = report.expression_id,
            task_id = report.task_id,
            elapsed_ms = report.elapsed_ms,
            "Task calculated, successor released",
        ),
        ReportOutcome::Finalized => tracing::info!(
            login = %report.login,
            expression_id = report.expression_id,
            result = report.result,
            "Expression calculated",
        ),
    }

    Ok(outcome)
}

/// Return every in-progress task to the ready state.
///
/// Called once before the dispatch listener starts accepting claims.
pub async fn recover(pool: &PgPool) -> AppResult<u64> {
    let reset = TaskRepo::reset_in_progress(pool).await?;
    if reset > 0 {
        tracing::warn!(reset, "Requeued tasks left in progress by a previous run");
    }
    Ok(reset)
}
