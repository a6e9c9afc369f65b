//! Logging and metrics setup for the controller process.

use std::net::SocketAddr;

use metrics::{describe_counter, describe_histogram};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Applies when `GAME_LOG` is unset or invalid. The kube client stack logs
/// every watch reconnect at info.
pub const DEFAULT_LOG_FILTER: &str = "info,kube=warn,tower=warn,hyper=warn";

pub const RECONCILE_TOTAL: &str = "game_reconcile_total";
pub const ALERTS_TOTAL: &str = "game_reconcile_alerts_total";
pub const CLUSTER_CALL_MS: &str = "game_cluster_call_ms";

fn log_filter(spec: Option<&str>) -> EnvFilter {
    spec.and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

pub fn init_tracing() {
    let spec = std::env::var("GAME_LOG").ok();
    tracing_subscriber::fmt().with_env_filter(log_filter(spec.as_deref())).with_target(true).init();
}

fn metrics_addr(raw: Option<&str>) -> Result<Option<SocketAddr>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| format!("invalid GAME_METRICS_ADDR {:?}; expected host:port", s)),
    }
}

fn describe_metrics() {
    describe_counter!(RECONCILE_TOTAL, "Lifecycle events handled, labelled by event and outcome");
    describe_counter!(ALERTS_TOTAL, "Games whose consecutive failures reached --alert-after");
    describe_histogram!(CLUSTER_CALL_MS, "Deployment API call latency in milliseconds, labelled by op");
}

/// Serve Prometheus metrics on `GAME_METRICS_ADDR` when it is set.
pub fn init_metrics() {
    let raw = std::env::var("GAME_METRICS_ADDR").ok();
    let sock = match metrics_addr(raw.as_deref()) {
        Ok(Some(sock)) => sock,
        Ok(None) => {
            debug!("GAME_METRICS_ADDR unset; metrics exporter disabled");
            return;
        }
        Err(e) => {
            warn!(error = %e, "metrics exporter disabled");
            return;
        }
    };
    match metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(sock).install() {
        Ok(()) => {
            describe_metrics();
            info!(addr = %sock, "game controller metrics at http://{}/metrics", sock);
        }
        Err(e) => warn!(addr = %sock, error = %e, "failed to install metrics exporter"),
    }
}
