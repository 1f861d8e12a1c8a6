use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abacus_api::config::ServerConfig;
use abacus_api::engine::dispatch;
use abacus_api::router::{build_app_router, build_dispatch_router};
use abacus_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abacus_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        dispatch_port = config.dispatch_port,
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = abacus_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    abacus_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    abacus_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Startup recovery ---
    // Must finish before the dispatch listener hands out any task.
    let reset = dispatch::recover(&pool)
        .await
        .expect("Failed to requeue in-progress tasks");
    tracing::info!(reset, "Startup recovery complete");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state.clone(), &config);
    let dispatch_app = build_dispatch_router(state, &config);

    // --- Start servers ---
    let ip = config.host.parse().expect("Invalid HOST address");
    let addr = SocketAddr::new(ip, config.port);
    let dispatch_addr = SocketAddr::new(ip, config.dispatch_port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind HTTP address");
    let dispatch_listener = tokio::net::TcpListener::bind(dispatch_addr)
        .await
        .expect("Failed to bind dispatch address");
    tracing::info!(%addr, %dispatch_addr, "Starting servers");

    let http = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let rpc =
        axum::serve(dispatch_listener, dispatch_app).with_graceful_shutdown(shutdown_signal());

    let (http_result, rpc_result) = tokio::join!(http, rpc);
    http_result.expect("HTTP server error");
    rpc_result.expect("Dispatch server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
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
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
