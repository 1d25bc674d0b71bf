use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and pre-register the pipeline metrics so
/// they appear in the first scrape.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    counter!("signals_detected_total").absolute(0);
    counter!("signals_ignored_total").absolute(0);
    counter!("trades_opened_total").absolute(0);
    counter!("trades_failed_total").absolute(0);
    counter!("principal_sold_total").absolute(0);
    counter!("trades_closed_total").absolute(0);
    counter!("passes_skipped_total").absolute(0);

    gauge!("open_trades").set(0.0);

    Ok(handle)
}
