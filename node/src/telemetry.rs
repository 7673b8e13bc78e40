// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Map a configured level name onto a tracing directive.
///
/// `fatal` and `panic` have no tracing equivalent and collapse to `error`;
/// anything unrecognised logs everything at `debug`.
pub fn level_directive(level: &str) -> &'static str {
    match level {
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" | "fatal" | "panic" => "error",
        _ => "debug",
    }
}

/// Initialize telemetry (logs + metrics)
///
/// `RUST_LOG` overrides `level`. With `metrics_addr` set, Prometheus is
/// scraped from an HTTP listener there; otherwise use `render_metrics`.
/// Must be called from within a tokio runtime.
pub fn init_telemetry(level: &str, metrics_addr: Option<SocketAddr>) {
    let lvl = level_directive(level);
    let default_filter = format!("lachesis_node={lvl},lachesis_cli={lvl},lachesis_proxy={lvl}");

    if let Err(e) = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or(default_filter),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        tracing::warn!("Tracing already initialized: {}", e);
    }

    match metrics_addr {
        Some(addr) => match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => tracing::info!("Serving metrics on {}", addr),
            Err(e) => tracing::warn!("Failed to start metrics listener on {}: {}", addr, e),
        },
        None => match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if PROM_HANDLE.set(handle).is_err() {
                    tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
                }
            }
            Err(e) => tracing::warn!("Failed to install metrics recorder: {}", e),
        },
    }

    metrics::describe_counter!("lachesis_blocks_committed_total", "Blocks committed through the proxy");
    metrics::describe_histogram!("lachesis_commit_duration_seconds", "Time taken by commit_block");
    metrics::describe_counter!("lachesis_transactions_submitted_total", "Transactions placed on the submit queue");
    metrics::describe_counter!("lachesis_submit_timeouts_total", "Submissions rejected because the queue stayed full");
    metrics::describe_counter!("lachesis_rpc_timeouts_total", "Outbound calls that exceeded their deadline");
    metrics::describe_counter!("lachesis_rpc_reconnects_total", "Reconnects after a lost connection");
    metrics::describe_counter!("lachesis_stale_responses_total", "Late responses discarded by correlation id");
}

/// Get the Prometheus handle to render metrics
pub fn render_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::level_directive;

    #[test]
    fn test_level_names() {
        assert_eq!(level_directive("info"), "info");
        assert_eq!(level_directive("fatal"), "error");
        assert_eq!(level_directive("panic"), "error");
        assert_eq!(level_directive("verbose"), "debug");
    }
}
