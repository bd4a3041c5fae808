use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all ledger metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("markets_created_total").absolute(0);
    counter!("markets_locked_total").absolute(0);
    counter!("markets_settled_total").absolute(0);
    counter!("bets_placed_total").absolute(0);
    counter!("centipoints_wagered_total").absolute(0);
    counter!("centipoints_paid_out_total").absolute(0);
    counter!("settlement_remainder_centipoints_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("settlement_duration_seconds").record(0.0);

    Ok(handle)
}

/// A handle backed by a recorder that is not installed globally. Used by
/// tests and tools that build several routers in one process.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
