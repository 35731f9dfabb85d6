//! # Internal Metrics Module
//!
//! Counters are recorded with the `metrics` macros at the call sites. When
//! the exporter is enabled, `MetricsBuilder` installs a Prometheus recorder
//! and returns a `MetricsServer` that serves `/metrics`; otherwise the
//! macros are no-ops.

use crate::config::MetricsConfig;
use crate::internal_metrics::server::MetricsServer;
use anyhow::Result;
use metrics::Unit;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

pub mod server;

/// Registers descriptions for every metric the daemon records.
pub fn describe_metrics() {
    metrics::describe_counter!("events_received_total", Unit::Count, "Events handed to the dispatcher queue.");
    metrics::describe_counter!("events_dropped_total", Unit::Count, "Events dropped at the ingress gate, labeled by reason.");
    metrics::describe_counter!("handler_runs_total", Unit::Count, "Event handler invocations, labeled by outcome.");
    metrics::describe_counter!("notifications_total", Unit::Count, "Notification attempts, labeled by notifier and outcome.");
    metrics::describe_counter!("alert_batches_received_total", Unit::Count, "Alert batches received by the transport.");
}

/// Builder for the metrics system.
pub struct MetricsBuilder {
    config: MetricsConfig,
}

impl MetricsBuilder {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Installs the Prometheus recorder and binds the exporter.
    ///
    /// Returns `Ok(None)` when the exporter is disabled. A recorder that
    /// cannot be installed (one is already set) is logged and the exporter
    /// is skipped.
    pub async fn build(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Option<(MetricsServer, SocketAddr)>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let listener = TcpListener::bind(self.config.listen_address).await?;
        let addr = listener.local_addr()?;

        if let Err(e) = metrics::set_global_recorder(recorder) {
            error!("Failed to install Prometheus recorder: {}", e);
            return Ok(None);
        }
        describe_metrics();
        info!(%addr, "Metrics exporter listening");

        Ok(Some((MetricsServer::new(listener, handle, shutdown_rx), addr)))
    }
}
