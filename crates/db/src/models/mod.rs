pub mod expression;
pub mod status;
pub mod task;
pub mod user;
