use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("snapshots_recorded_total", "outcome" => "accepted").absolute(0);
    counter!("snapshots_recorded_total", "outcome" => "duplicate").absolute(0);
    counter!("snapshots_out_of_order_total").absolute(0);
    counter!("periods_opened_total").absolute(0);
    counter!("periods_closed_total").absolute(0);
    counter!("rewards_granted_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("ingest_latency_seconds").record(0.0);

    handle
}
