use prometheus_client::registry::Registry;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::repository::ClientStore;
use crate::server::monitoring::{register_build_info_metric, ApiMetrics};

pub struct AppState {
    pub store: ClientStore,
    pub shutdown_token: CancellationToken,
    pub registry: RwLock<Registry>,
    pub metrics: ApiMetrics,
}

impl AppState {
    pub fn new(store: ClientStore, shutdown_token: CancellationToken) -> Self {
        let mut registry = <Registry>::default();
        let metrics = ApiMetrics::register(&mut registry, "shiptivity");
        register_build_info_metric(&mut registry, "shiptivity");

        Self {
            store,
            shutdown_token,
            registry: RwLock::new(registry),
            metrics,
        }
    }
}
