use crate::build_info;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Registers immutable build metadata as a labeled gauge set to `1`.
pub fn register_build_info_metric(registry: &mut Registry, prefix: &str) {
    let build_info_metric = Family::<BuildInfoLabels, Gauge>::default();
    build_info_metric
        .get_or_create(&BuildInfoLabels {
            service: "shiptivity",
            version: build_info::VERSION,
            commit: build_info::short_commit_hash(),
        })
        .set(1);
    let sub_registry = registry.sub_registry_with_prefix(prefix);
    sub_registry.register(
        "build_info",
        "Build identity labels for this process",
        build_info_metric,
    );
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct BuildInfoLabels {
    service: &'static str,
    version: &'static str,
    commit: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RejectionLabels {
    pub reason: &'static str,
}

#[derive(Clone)]
pub struct ApiMetrics {
    /// Client changes committed, including no-op changes.
    pub client_updates_total: Counter,
    /// Rows whose status or priority were rewritten by reorders.
    pub rows_rewritten_total: Counter,
    /// Requests answered with a validation or store error, by reason.
    pub rejected_requests_total: Family<RejectionLabels, Counter>,
}

impl ApiMetrics {
    fn init() -> Self {
        Self {
            client_updates_total: Counter::default(),
            rows_rewritten_total: Counter::default(),
            rejected_requests_total: Family::default(),
        }
    }

    pub fn register(registry: &mut Registry, prefix: &str) -> Self {
        let metrics = Self::init();
        let sub_registry = registry.sub_registry_with_prefix(prefix);
        sub_registry.register(
            "client_updates",
            "Total number of client changes committed",
            metrics.client_updates_total.clone(),
        );
        sub_registry.register(
            "rows_rewritten",
            "Total number of client rows rewritten by reorders",
            metrics.rows_rewritten_total.clone(),
        );
        sub_registry.register(
            "rejected_requests",
            "Total number of rejected API requests",
            metrics.rejected_requests_total.clone(),
        );
        metrics
    }

    pub fn record_rejection(&self, reason: &'static str) {
        self.rejected_requests_total
            .get_or_create(&RejectionLabels { reason })
            .inc();
    }
}
