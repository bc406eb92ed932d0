// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock posting transport that records deliveries.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dealcast_core::traits::{PluginAdapter, PostingTransport};
use dealcast_core::types::{AdapterType, Campaign, DeliveryReport, HealthStatus, QueuedProduct};
use dealcast_core::DealcastError;

enum Scripted {
    Channels(Vec<String>),
    Fail(String),
}

/// A posting transport for tests.
///
/// Unless scripted otherwise, every channel of the campaign accepts the post
/// and the published link is the product link unchanged.
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    deliveries: Arc<Mutex<Vec<QueuedProduct>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            deliveries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The next delivery returns an error.
    pub async fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Fail(message.to_string()));
    }

    /// The next delivery reaches only `channels` (empty means nothing delivered).
    pub async fn push_partial(&self, channels: &[&str]) {
        self.script.lock().await.push_back(Scripted::Channels(
            channels.iter().map(|c| c.to_string()).collect(),
        ));
    }

    /// Every product handed to `deliver`, including failed attempts.
    pub async fn deliveries(&self) -> Vec<QueuedProduct> {
        self.deliveries.lock().await.clone()
    }

    pub async fn delivery_count(&self) -> usize {
        self.deliveries.lock().await.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        Ok(())
    }
}

#[async_trait]
impl PostingTransport for MockTransport {
    async fn deliver(
        &self,
        campaign: &Campaign,
        product: &QueuedProduct,
    ) -> Result<DeliveryReport, DealcastError> {
        self.deliveries.lock().await.push(product.clone());

        let delivered_channels = match self.script.lock().await.pop_front() {
            Some(Scripted::Fail(message)) => {
                return Err(DealcastError::Delivery {
                    message,
                    source: None,
                });
            }
            Some(Scripted::Channels(channels)) => channels,
            None => campaign.channels.clone(),
        };

        Ok(DeliveryReport {
            delivered_channels,
            final_link: product.payload.link.clone(),
        })
    }
}
