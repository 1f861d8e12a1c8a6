//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument, or a transaction when the call must take
//! part in a larger atomic unit.

pub mod expression_repo;
pub mod task_repo;
pub mod user_repo;

pub use expression_repo::ExpressionRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;

/// Transaction handle accepted by repository methods that participate in a
/// caller-owned transaction.
pub type Tx<'c> = sqlx::Transaction<'c, sqlx::Postgres>;
