//! Fixed-size pool of workers polling the dispatcher.
//!
//! Every worker runs the same loop: claim, compute, report. Claims from
//! one process go through a shared mutex so at most one claim request is
//! in flight at a time. Cross-process safety comes from the dispatcher's
//! atomic claim, not from this lock.

use std::sync::Arc;
use std::time::Duration;

use abacus_core::dispatch::TaskReport;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::{DispatchClient, DispatchClientError};
use crate::compute::{compute, Latencies};

/// A pool of `size` workers sharing one dispatch client.
pub struct WorkerPool<C> {
    client: Arc<C>,
    size: usize,
    latencies: Latencies,
    idle_poll: Duration,
    claim_lock: Arc<Mutex<()>>,
}

impl<C: DispatchClient + 'static> WorkerPool<C> {
    pub fn new(client: C, size: usize, latencies: Latencies, idle_poll: Duration) -> Self {
        Self {
            client: Arc::new(client),
            size,
            latencies,
            idle_poll,
            claim_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run every worker until `cancel` fires, then wait for them to exit.
    ///
    /// A worker that is computing when cancellation arrives finishes the
    /// task and reports it before exiting.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            workers = self.size,
            idle_poll_ms = self.idle_poll.as_millis() as u64,
            "Worker pool started",
        );

        let mut handles = Vec::with_capacity(self.size);
        for worker in 0..self.size {
            let ctx = WorkerContext {
                worker,
                client: Arc::clone(&self.client),
                latencies: self.latencies,
                idle_poll: self.idle_poll,
                claim_lock: Arc::clone(&self.claim_lock),
            };
            handles.push(tokio::spawn(ctx.run(cancel.clone())));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }

        tracing::info!("Worker pool stopped");
    }
}

struct WorkerContext<C> {
    worker: usize,
    client: Arc<C>,
    latencies: Latencies,
    idle_poll: Duration,
    claim_lock: Arc<Mutex<()>>,
}

impl<C: DispatchClient> WorkerContext<C> {
    async fn run(self, cancel: CancellationToken) {
        tracing::debug!(worker = self.worker, "Worker started");

        while !cancel.is_cancelled() {
            let claimed = {
                let _guard = self.claim_lock.lock().await;
                self.client.claim().await
            };

            match claimed {
                Ok(item) => {
                    let computed = compute(&item, &self.latencies).await;
                    let report =
                        TaskReport::for_item(&item, computed.elapsed_ms(), computed.result);

                    // A failed report is not retried; the task stays in
                    // progress until the dispatcher's startup recovery.
                    match self.client.report(&report).await {
                        Ok(()) => tracing::debug!(
                            worker = self.worker,
                            login = %item.login,
                            expression_id = item.expression_id,
                            task_id = item.task_id,
                            result = computed.result,
                            elapsed_ms = report.elapsed_ms,
                            "Task reported",
                        ),
                        Err(e) => tracing::warn!(
                            worker = self.worker,
                            expression_id = item.expression_id,
                            task_id = item.task_id,
                            error = %e,
                            "Failed to report task result",
                        ),
                    }
                }
                Err(DispatchClientError::NoWork) => self.pause(&cancel).await,
                Err(e) => {
                    tracing::warn!(worker = self.worker, error = %e, "Claim failed");
                    self.pause(&cancel).await;
                }
            }
        }

        tracing::debug!(worker = self.worker, "Worker stopped");
    }

    async fn pause(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.idle_poll) => {}
        }
    }
}
