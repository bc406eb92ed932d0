// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram adapters for the Dealcast posting engine.
//!
//! [`TelegramTransport`] publishes queued products to every channel of a
//! campaign; [`TelegramNotifier`] sends owner notifications as direct messages.

pub mod render;

use std::time::Duration;

use async_trait::async_trait;
use dealcast_config::model::TelegramConfig;
use dealcast_core::error::DealcastError;
use dealcast_core::traits::{NotificationSink, PluginAdapter, PostingTransport};
use dealcast_core::types::{
    AdapterType, Campaign, DeliveryReport, HealthStatus, Notification, QueuedProduct,
};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile};
use tracing::{debug, info, warn};

use crate::render::{build_final_link, is_postable, parse_recipient, render_caption};

fn build_bot(config: &TelegramConfig) -> Result<Bot, DealcastError> {
    let token = config.bot_token.as_deref().ok_or_else(|| {
        DealcastError::Config("telegram.bot_token is required for posting".into())
    })?;
    if token.is_empty() {
        return Err(DealcastError::Config(
            "telegram.bot_token cannot be empty".into(),
        ));
    }

    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| DealcastError::Config(format!("failed to build Telegram HTTP client: {e}")))?;
    Ok(Bot::with_client(token, client))
}

async fn probe(bot: &Bot) -> HealthStatus {
    match bot.get_me().await {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => HealthStatus::Unhealthy(format!("Telegram bot unreachable: {e}")),
    }
}

/// Posting transport that sends one photo (or text) post per channel.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, DealcastError> {
        let bot = build_bot(config)?;
        info!("Telegram transport initialized");
        Ok(Self { bot })
    }

    /// A notifier sharing this transport's bot.
    pub fn notifier(&self) -> TelegramNotifier {
        TelegramNotifier {
            bot: self.bot.clone(),
        }
    }

    async fn send_to(
        &self,
        channel: &str,
        photo: Option<&reqwest::Url>,
        caption: &str,
    ) -> Result<(), teloxide::RequestError> {
        let recipient = parse_recipient(channel);
        match photo {
            Some(url) => {
                self.bot
                    .send_photo(recipient, InputFile::url(url.clone()))
                    .caption(caption)
                    .await?;
            }
            None => {
                self.bot.send_message(recipient, caption).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        Ok(probe(&self.bot).await)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        debug!("Telegram transport shutting down");
        Ok(())
    }
}

#[async_trait]
impl PostingTransport for TelegramTransport {
    async fn deliver(
        &self,
        campaign: &Campaign,
        product: &QueuedProduct,
    ) -> Result<DeliveryReport, DealcastError> {
        if !is_postable(&product.payload) {
            warn!(
                campaign_id = campaign.id,
                product_id = %product.product_id,
                "product lacks a title or price, not posting"
            );
            return Ok(DeliveryReport::default());
        }

        let final_link = build_final_link(&product.payload.link, campaign);
        let caption = render_caption(&product.payload, &final_link);
        let photo = product
            .payload
            .images
            .first()
            .and_then(|url| reqwest::Url::parse(url).ok());

        let mut delivered_channels = Vec::with_capacity(campaign.channels.len());
        for channel in &campaign.channels {
            match self.send_to(channel, photo.as_ref(), &caption).await {
                Ok(()) => {
                    metrics::counter!("dealcast_channel_sends_total", "outcome" => "ok")
                        .increment(1);
                    delivered_channels.push(channel.clone());
                }
                Err(e) => {
                    metrics::counter!("dealcast_channel_sends_total", "outcome" => "error")
                        .increment(1);
                    warn!(
                        campaign_id = campaign.id,
                        channel = %channel,
                        error = %e,
                        "channel post failed"
                    );
                }
            }
        }

        Ok(DeliveryReport {
            delivered_channels,
            final_link,
        })
    }
}

/// Sends owner notifications as direct messages to numeric user ids.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, DealcastError> {
        Ok(Self {
            bot: build_bot(config)?,
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram-notifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        Ok(probe(&self.bot).await)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify(
        &self,
        user_id: &str,
        notification: &Notification,
    ) -> Result<(), DealcastError> {
        let chat_id = user_id
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| DealcastError::Notify {
                message: format!("not a Telegram user id: {user_id}"),
                source: None,
            })?;

        self.bot
            .send_message(chat_id, notification.message())
            .await
            .map_err(|e| DealcastError::Notify {
                message: format!("failed to notify {user_id}: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealcast_core::types::QueueStatus;
    use dealcast_test_utils::fixtures::candidate;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramTransport::new(&config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramTransport::new(&config(Some(""))).is_err());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let transport = TelegramTransport::new(&config(Some("123:ABC"))).unwrap();
        assert_eq!(transport.name(), "telegram");
        assert_eq!(transport.adapter_type(), AdapterType::Transport);
        assert_eq!(transport.notifier().adapter_type(), AdapterType::Notifier);
    }

    #[tokio::test]
    async fn unpostable_product_is_not_sent() {
        let transport = TelegramTransport::new(&config(Some("123:ABC"))).unwrap();
        let mut payload = candidate("B1", None, Some(10)).payload;
        payload.price = None;
        let product = QueuedProduct {
            id: 1,
            campaign_id: 1,
            product_id: "B1".into(),
            parent_id: None,
            quality_score: Some(10),
            payload,
            status: QueueStatus::Queued,
            discovered_at: String::new(),
            posted_at: None,
        };
        let campaign = Campaign {
            id: 1,
            name: "c".into(),
            status: dealcast_core::CampaignStatus::Running,
            channels: vec!["@deals".into()],
            categories: vec![],
            filters: Default::default(),
            posting_frequency: 0,
            track_id: None,
            created_by: None,
            last_post_time: None,
            created_at: String::new(),
        };

        let report = transport.deliver(&campaign, &product).await.unwrap();
        assert!(!report.success());
    }

    #[tokio::test]
    async fn notifier_rejects_non_numeric_user() {
        let notifier = TelegramNotifier::new(&config(Some("123:ABC"))).unwrap();
        let err = notifier
            .notify(
                "owner",
                &Notification::PopulationComplete {
                    campaign_id: 1,
                    campaign_name: "c".into(),
                    count: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DealcastError::Notify { .. }));
    }
}
