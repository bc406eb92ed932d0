// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner notification collaborator.

use async_trait::async_trait;

use crate::error::DealcastError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Notification;

/// Sends population outcomes to the campaign owner.
#[async_trait]
pub trait NotificationSink: PluginAdapter {
    async fn notify(&self, user_id: &str, notification: &Notification)
    -> Result<(), DealcastError>;
}
