//! Expression rows and their API projection.

use abacus_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{ExpressionStatus, StatusId};

/// A row from the `expressions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Expression {
    pub id: DbId,
    pub login: String,
    /// Per-user sequence number.
    pub expression_id: DbId,
    pub expression: String,
    pub status_id: StatusId,
    pub result: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Expression {
    pub fn status(&self) -> Option<ExpressionStatus> {
        ExpressionStatus::from_id(self.status_id)
    }

    pub fn is_calculated(&self) -> bool {
        self.status() == Some(ExpressionStatus::Calculated)
    }
}

/// Public view of an expression returned by the query endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionView {
    pub id: DbId,
    pub expression: String,
    pub status: &'static str,
    pub result: Option<f64>,
}

impl From<Expression> for ExpressionView {
    fn from(row: Expression) -> Self {
        let status = row
            .status()
            .unwrap_or(ExpressionStatus::NotCalculated)
            .name();
        let result = if row.is_calculated() { row.result } else { None };
        Self {
            id: row.expression_id,
            expression: row.expression,
            status,
            result,
        }
    }
}
