//! Calculation engine.
//!
//! Contains the submission path that turns an expression into a persisted
//! task chain, and the dispatch operations that hand tasks to workers and
//! fold their results back into the chain.

pub mod dispatch;
pub mod scheduler;
