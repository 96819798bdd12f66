use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use itemkeeper_store::{FileKv, RecordStore};
use itemkeeper_sync::{PgLedger, RemoteLedger};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itemkeeper_api::background::bin_expiry;
use itemkeeper_api::config::ServerConfig;
use itemkeeper_api::router::build_app_router;
use itemkeeper_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "itemkeeper_api=debug,itemkeeper_sync=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Local store ---
    let store = RecordStore::new(Arc::new(FileKv::new(config.data_dir.clone())));
    if !store.check_version() {
        tracing::info!(data_dir = %config.data_dir.display(), "Local store schema marker updated");
    }

    // --- Cloud ledger (optional) ---
    let ledger: Option<Arc<dyn RemoteLedger>> = match &config.database_url {
        Some(database_url) => {
            let pool = itemkeeper_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            itemkeeper_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            itemkeeper_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let ledger: Arc<dyn RemoteLedger> = Arc::new(PgLedger::new(pool));
            Some(ledger)
        }
        None => {
            tracing::info!("DATABASE_URL not set, cloud sync disabled");
            None
        }
    };

    // --- App state ---
    let state = AppState::new(config.clone(), store.clone(), ledger);

    // --- Recycle bin sweep ---
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(bin_expiry::run(
        store,
        Arc::clone(&state.local_lock),
        config.bin_retention_days,
        Duration::from_secs(config.bin_sweep_interval_secs),
        sweep_cancel.clone(),
    ));

    // --- Router ---
    let app = build_app_router(state.clone());

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Recycle bin sweep stopped");

    // Dropping the last state clone closes the mirror queue; the worker
    // finishes what is already queued and exits.
    let mirror_worker = state.sync.as_ref().and_then(|s| s.take_mirror_worker());
    drop(state);
    if let Some(handle) = mirror_worker {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Mirror queue drained");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
