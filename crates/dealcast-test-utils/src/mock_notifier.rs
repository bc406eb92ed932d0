// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification sink that captures notifications.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dealcast_core::traits::{NotificationSink, PluginAdapter};
use dealcast_core::types::{AdapterType, HealthStatus, Notification};
use dealcast_core::DealcastError;

/// Records every `(user_id, notification)` pair it is asked to send.
#[derive(Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<(String, Notification)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockNotifier {
    fn name(&self) -> &str {
        "mock-notifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for MockNotifier {
    async fn notify(
        &self,
        user_id: &str,
        notification: &Notification,
    ) -> Result<(), DealcastError> {
        self.sent
            .lock()
            .await
            .push((user_id.to_string(), notification.clone()));
        Ok(())
    }
}
