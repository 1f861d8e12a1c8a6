//! Wire types of the worker dispatch protocol.
//!
//! Shared by the dispatch endpoints in the API server and the HTTP client in
//! the worker pool so both sides serialize the same shapes.

use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::types::DbId;

/// A task handed to a worker by `claim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub login: String,
    pub expression_id: DbId,
    pub task_id: DbId,
    pub arg1: f64,
    pub arg2: f64,
    pub operator: Operator,
}

/// A computed result sent back by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub login: String,
    pub expression_id: DbId,
    pub task_id: DbId,
    /// Simulated computation time actually spent, in milliseconds.
    pub elapsed_ms: i64,
    pub result: f64,
}

impl TaskReport {
    /// Build the report for a finished work item.
    pub fn for_item(item: &WorkItem, elapsed_ms: i64, result: f64) -> Self {
        Self {
            login: item.login.clone(),
            expression_id: item.expression_id,
            task_id: item.task_id,
            elapsed_ms,
            result,
        }
    }
}

/// Empty acknowledgement body returned by `report`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReportAck {}

/// Route paths of the dispatch protocol, relative to the dispatch base URL.
pub const CLAIM_PATH: &str = "/rpc/v1/tasks/claim";
pub const REPORT_PATH: &str = "/rpc/v1/tasks/report";
