// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics exporter for Dealcast.
//!
//! Installs the metrics-rs global recorder. With a listen address the
//! exporter also serves the text format over HTTP on that socket.

use std::net::SocketAddr;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use dealcast_core::traits::PluginAdapter;
use dealcast_core::types::{AdapterType, HealthStatus};
use dealcast_core::DealcastError;

/// Prometheus recorder plus an optional scrape endpoint.
pub struct PrometheusExporter {
    handle: PrometheusHandle,
    listen: Option<SocketAddr>,
}

impl PrometheusExporter {
    /// Install the recorder globally. Only one recorder can be installed per
    /// process; a second call fails.
    ///
    /// With `listen` set this must run inside a tokio runtime, which drives
    /// the HTTP endpoint.
    pub fn install(listen: Option<SocketAddr>) -> Result<Self, DealcastError> {
        let handle = match listen {
            None => PrometheusBuilder::new().install_recorder().map_err(|e| {
                DealcastError::Internal(format!("failed to install Prometheus recorder: {e}"))
            })?,
            Some(addr) => {
                let (recorder, exporter) = PrometheusBuilder::new()
                    .with_http_listener(addr)
                    .build()
                    .map_err(|e| {
                        DealcastError::Internal(format!("failed to build Prometheus exporter: {e}"))
                    })?;
                let handle = recorder.handle();
                metrics::set_global_recorder(recorder).map_err(|_| {
                    DealcastError::Internal("a metrics recorder is already installed".into())
                })?;
                tokio::spawn(async move {
                    if let Err(e) = exporter.await {
                        tracing::error!(error = ?e, "prometheus exporter stopped");
                    }
                });
                handle
            }
        };

        match listen {
            Some(addr) => tracing::info!(%addr, "prometheus exporter listening"),
            None => tracing::info!("prometheus metrics recorder installed"),
        }
        Ok(Self { handle, listen })
    }

    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusExporter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        Ok(())
    }
}
