// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const DEFAULT_FILTER: &str = "certblob_node=info";

/// Initialize telemetry (logs + metrics). Safe to call more than once; later
/// calls keep the first subscriber and recorder.
pub fn init_telemetry() {
    // 1. Tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }

    // 2. Metrics
    if PROM_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = PROM_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!("metrics recorder not installed: {}", e),
        }
    }

    metrics::describe_counter!(
        "certblob_reads_verified_total",
        "Blobs returned to callers after certificate and witness verification"
    );
    metrics::describe_counter!(
        "certblob_read_failures_total",
        "Reads rejected by certified-read verification"
    );
    metrics::describe_counter!("certblob_puts_total", "Blobs handed to a storage transport");
}

/// Renders the counters in Prometheus text format.
pub fn get_metrics() -> String {
    match PROM_HANDLE.get() {
        Some(handle) => handle.render(),
        None => "# metrics not initialized".to_string(),
    }
}
