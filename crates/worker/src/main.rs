//! `abacus-worker` -- computes tasks handed out by the dispatch service.
//!
//! Configuration is read from the environment; see
//! [`WorkerConfig::from_env`](abacus_worker::config::WorkerConfig::from_env).

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abacus_worker::client::HttpDispatchClient;
use abacus_worker::config::WorkerConfig;
use abacus_worker::pool::WorkerPool;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abacus_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(
        dispatch_url = %config.dispatch_url,
        computing_power = config.computing_power,
        latencies = ?config.latencies,
        "Starting abacus-worker",
    );

    let client = HttpDispatchClient::new(&config.dispatch_url, config.rpc_timeout)
        .expect("Failed to build dispatch HTTP client");

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    WorkerPool::new(
        client,
        config.computing_power,
        config.latencies,
        config.idle_poll,
    )
    .run(cancel)
    .await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), finishing in-flight tasks");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, finishing in-flight tasks");
        }
    }
}
