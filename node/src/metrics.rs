//! Prometheus metrics for registry node observability.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, IntCounter, IntGauge, Opts, Registry,
};

/// Container for all node metrics, backed by an owned registry.
///
/// The registry is handed to the RPC server so `/metrics` can expose
/// everything registered here.
pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ──
    pub badges_minted: IntCounter,
    pub badges_cloned: IntCounter,
    pub transfers: IntCounter,
    pub clone_rejections: IntCounter,
    pub rpc_requests: IntCounter,

    // ── Gauges ──
    pub badge_count: IntGauge,
    pub ws_clients: IntGauge,

    // ── Histograms ──
    pub op_duration_ms: Histogram,
}

impl NodeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let badges_minted = register_int_counter_with_registry!(
            Opts::new("crest_badges_minted_total", "Total badges minted"),
            registry
        )
        .expect("failed to register crest_badges_minted_total");

        let badges_cloned = register_int_counter_with_registry!(
            Opts::new("crest_badges_cloned_total", "Total badges cloned"),
            registry
        )
        .expect("failed to register crest_badges_cloned_total");

        let transfers = register_int_counter_with_registry!(
            Opts::new("crest_transfers_total", "Total badge ownership transfers"),
            registry
        )
        .expect("failed to register crest_transfers_total");

        let clone_rejections = register_int_counter_with_registry!(
            Opts::new(
                "crest_clone_rejections_total",
                "Clone requests rejected for authorization or quota reasons"
            ),
            registry
        )
        .expect("failed to register crest_clone_rejections_total");

        let rpc_requests = register_int_counter_with_registry!(
            Opts::new("crest_rpc_requests_total", "Total RPC requests served"),
            registry
        )
        .expect("failed to register crest_rpc_requests_total");

        let badge_count = register_int_gauge_with_registry!(
            Opts::new("crest_badge_count", "Number of badges in the store"),
            registry
        )
        .expect("failed to register crest_badge_count");

        let ws_clients = register_int_gauge_with_registry!(
            Opts::new("crest_ws_clients", "Connected WebSocket clients"),
            registry
        )
        .expect("failed to register crest_ws_clients");

        let op_duration_ms = register_histogram_with_registry!(
            prometheus::HistogramOpts::new(
                "crest_op_duration_ms",
                "Mutation latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15).unwrap()),
            registry
        )
        .expect("failed to register crest_op_duration_ms");

        Self {
            registry,
            badges_minted,
            badges_cloned,
            transfers,
            clone_rejections,
            rpc_requests,
            badge_count,
            ws_clients,
            op_duration_ms,
        }
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
