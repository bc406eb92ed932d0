// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Posting transport collaborator.

use async_trait::async_trait;

use crate::error::DealcastError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Campaign, DeliveryReport, QueuedProduct};

/// Renders a product and publishes it to a campaign's channels.
#[async_trait]
pub trait PostingTransport: PluginAdapter {
    /// Delivers `product` to every channel of `campaign`.
    ///
    /// Partial failure is reported through [`DeliveryReport::delivered_channels`];
    /// an `Err` means nothing was delivered.
    async fn deliver(
        &self,
        campaign: &Campaign,
        product: &QueuedProduct,
    ) -> Result<DeliveryReport, DealcastError>;
}
