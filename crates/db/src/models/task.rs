//! Task rows: one atomic binary operation of an expression's chain.

use abacus_core::dispatch::WorkItem;
use abacus_core::error::CoreError;
use abacus_core::operator::Operator;
use abacus_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::status::{StatusId, TaskStatus};

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: DbId,
    pub login: String,
    pub expression_id: DbId,
    /// 1-based position in the chain.
    pub task_id: DbId,
    pub arg1: f64,
    pub arg2: f64,
    /// Operator symbol (`+`, `-`, `*`, `/`).
    pub operation: String,
    pub status_id: StatusId,
    pub elapsed_ms: Option<i64>,
    pub result: Option<f64>,
    pub claimed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::from_id(self.status_id)
    }

    pub fn key(&self) -> TaskKey<'_> {
        TaskKey {
            login: &self.login,
            expression_id: self.expression_id,
            task_id: self.task_id,
        }
    }

    /// Convert a claimed row into the payload sent to a worker.
    pub fn into_work_item(self) -> Result<WorkItem, CoreError> {
        let operator = Operator::from_symbol(&self.operation)?;
        Ok(WorkItem {
            login: self.login,
            expression_id: self.expression_id,
            task_id: self.task_id,
            arg1: self.arg1,
            arg2: self.arg2,
            operator,
        })
    }
}

/// Natural key of a task: owner, expression and chain position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskKey<'a> {
    pub login: &'a str,
    pub expression_id: DbId,
    pub task_id: DbId,
}

impl<'a> TaskKey<'a> {
    /// The key of the task that follows this one in the same chain.
    pub fn successor(self) -> Self {
        Self {
            task_id: self.task_id + 1,
            ..self
        }
    }
}
