use std::time::Duration;

use crate::compute::Latencies;

/// Worker pool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the dispatch listener.
    pub dispatch_url: String,
    /// Number of concurrent workers.
    pub computing_power: usize,
    /// Simulated time spent on each operator.
    pub latencies: Latencies,
    /// Pause after a "no work" answer or a transport error.
    pub idle_poll: Duration,
    /// Per-request timeout for dispatch calls.
    pub rpc_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `DISPATCH_URL`            | `http://127.0.0.1:5000` |
    /// | `COMPUTING_POWER`         | `4`                     |
    /// | `TIME_ADDITION_MS`        | `1000`                  |
    /// | `TIME_SUBTRACTION_MS`     | `1000`                  |
    /// | `TIME_MULTIPLICATIONS_MS` | `2000`                  |
    /// | `TIME_DIVISIONS_MS`       | `2000`                  |
    /// | `IDLE_POLL_MS`            | `50`                    |
    /// | `RPC_TIMEOUT_SECS`        | `10`                    |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but not a valid number, or if
    /// `COMPUTING_POWER` is zero.
    pub fn from_env() -> Self {
        let dispatch_url =
            std::env::var("DISPATCH_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".into());

        let computing_power: usize = env_number("COMPUTING_POWER", 4);
        assert!(computing_power > 0, "COMPUTING_POWER must be at least 1");

        let latencies = Latencies {
            addition: Duration::from_millis(env_number("TIME_ADDITION_MS", 1000)),
            subtraction: Duration::from_millis(env_number("TIME_SUBTRACTION_MS", 1000)),
            multiplication: Duration::from_millis(env_number("TIME_MULTIPLICATIONS_MS", 2000)),
            division: Duration::from_millis(env_number("TIME_DIVISIONS_MS", 2000)),
        };

        Self {
            dispatch_url,
            computing_power,
            latencies,
            idle_poll: Duration::from_millis(env_number("IDLE_POLL_MS", 50)),
            rpc_timeout: Duration::from_secs(env_number("RPC_TIMEOUT_SECS", 10)),
        }
    }
}

fn env_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid non-negative integer")),
        Err(_) => default,
    }
}
