//! Domain core for the abacus calculator.
//!
//! Pure logic shared by the API server and the worker pool: the error
//! taxonomy, the operator set, the expression compiler and the wire types
//! of the dispatch protocol. Nothing in this crate performs I/O.

pub mod dispatch;
pub mod error;
pub mod expression;
pub mod operator;
pub mod types;
