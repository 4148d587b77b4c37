use shiptivity_lib::{
    cli::parse_args,
    config::{Config, ConfigError},
    logging::{format_error_report, init_logging},
    repository::{ClientStore, StoreError},
    server::setup_server_with_addr,
    state::AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open client store: {0}")]
    Store(#[from] StoreError),
    #[error("failed to start API server: {0}")]
    Io(#[from] std::io::Error),
}

/// Cancels the shared token when SIGTERM or SIGINT is received.
async fn handle_shutdown_signals(state: Arc<AppState>) -> Result<(), std::io::Error> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down.");
        }
        _ = sigint.recv() => {
            info!("SIGINT received, shutting down.");
        }
    }

    state.shutdown_token.cancel();
    Ok(())
}

async fn run() -> Result<(), StartupError> {
    let args = parse_args();
    let config = Config::from_env()?.with_cli_overrides(&args);
    debug!(?config, "Config loaded");

    let store = ClientStore::open(&config.db_url)?;
    let state = Arc::new(AppState::new(store, CancellationToken::new()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server_handle = setup_server_with_addr(state.clone(), addr).await?;

    handle_shutdown_signals(state.clone()).await?;

    if let Err(err) = server_handle.await {
        error!(event = "api_server_join_failed", error = %err, "API server task failed");
    }

    // Last reference to the store; dropping it closes the SQLite connection.
    drop(state);
    info!(event = "shutdown_complete", "database connection closed");
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging("shiptivity", "info");

    if let Err(err) = run().await {
        error!(
            event = "startup_failed",
            report = %format_error_report(&err),
            "shiptivity exited with an error"
        );
        std::process::exit(1);
    }
}
