mod clients;
pub mod error;
pub mod monitoring;

use crate::state::AppState;
use prometheus_client::encoding::text::encode;

use axum::http::StatusCode;
use axum::{extract::State, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

pub const CLIENTS_ROUTE: &str = "/api/v1/clients";
pub const CLIENT_ROUTE: &str = "/api/v1/clients/{id}";

async fn health_handler() -> &'static str {
    "ok"
}

async fn expose_metrics(State(state): State<Arc<AppState>>) -> Result<String, StatusCode> {
    let mut buffer = String::new();
    let registry = state.registry.read().await;
    encode(&mut buffer, &registry).map_err(|err| {
        error!(event = "metrics_encode_failed", error = %err, "failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(buffer)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(clients::root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(expose_metrics))
        .route(CLIENTS_ROUTE, get(clients::list_clients))
        .route(CLIENT_ROUTE, get(clients::get_client).put(clients::update_client))
        .with_state(state)
}

/// Binds `addr` and serves the API until the state's shutdown token is cancelled.
pub async fn setup_server_with_addr(
    state: Arc<AppState>,
    addr: SocketAddr,
) -> Result<tokio::task::JoinHandle<()>, std::io::Error> {
    let shutdown_token = state.shutdown_token.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(event = "api_listening", %addr, "shiptivity API listening");

    let server_handle = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
            })
            .await;
        if let Err(err) = result {
            error!(event = "api_server_failed", error = %err, "API server failed");
        }
    });

    Ok(server_handle)
}
