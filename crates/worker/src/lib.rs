//! Abacus worker pool.
//!
//! Long-running workers that claim tasks from the dispatch service, spend
//! the configured simulated time on each operation, and report the result
//! back.

pub mod client;
pub mod compute;
pub mod config;
pub mod pool;
