//! Simulated computation of a single task.

use std::time::{Duration, Instant};

use abacus_core::dispatch::WorkItem;
use abacus_core::operator::Operator;

/// Simulated time each operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latencies {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl Latencies {
    /// The same latency for every operator.
    pub fn uniform(latency: Duration) -> Self {
        Self {
            addition: latency,
            subtraction: latency,
            multiplication: latency,
            division: latency,
        }
    }

    pub fn for_operator(&self, operator: Operator) -> Duration {
        match operator {
            Operator::Add => self.addition,
            Operator::Subtract => self.subtraction,
            Operator::Multiply => self.multiplication,
            Operator::Divide => self.division,
        }
    }
}

/// Outcome of computing one work item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Computed {
    pub result: f64,
    /// Wall time actually spent, including the simulated delay.
    pub elapsed: Duration,
}

impl Computed {
    /// Elapsed time in whole milliseconds, as reported to the dispatcher.
    pub fn elapsed_ms(&self) -> i64 {
        i64::try_from(self.elapsed.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Sleep for the operator's latency, then apply it to the operands.
pub async fn compute(item: &WorkItem, latencies: &Latencies) -> Computed {
    let started = Instant::now();
    tokio::time::sleep(latencies.for_operator(item.operator)).await;
    let result = item.operator.apply(item.arg1, item.arg2);
    Computed {
        result,
        elapsed: started.elapsed(),
    }
}
