// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caption and link rendering for product posts.

use dealcast_core::types::{Campaign, ProductPayload};
use teloxide::types::{ChatId, Recipient};

/// Telegram's limit for photo captions, in characters.
pub const CAPTION_LIMIT: usize = 1024;

const FEATURE_BULLETS: usize = 3;

/// Appends the campaign's tracking parameters to the product link.
///
/// `utm_campaign` carries the campaign name with spaces replaced by
/// underscores; `tag` carries the tracking id when one is configured.
pub fn build_final_link(link: &str, campaign: &Campaign) -> String {
    if link.is_empty() {
        return String::new();
    }

    let mut params = vec![format!("utm_campaign={}", campaign.name.replace(' ', "_"))];
    if let Some(tag) = campaign.track_id.as_deref().filter(|t| !t.is_empty()) {
        params.push(format!("tag={tag}"));
    }

    let separator = if link.contains('?') { '&' } else { '?' };
    format!("{link}{separator}{}", params.join("&"))
}

/// Plain-text post body: title, rating and price lines, up to three
/// feature bullets, then the link. Truncated to [`CAPTION_LIMIT`].
pub fn render_caption(payload: &ProductPayload, final_link: &str) -> String {
    let mut text = payload.title.trim().to_string();

    match (payload.rating, payload.review_count) {
        (Some(rating), Some(reviews)) => {
            text.push_str(&format!("\n⭐ {rating:.1}/5 ({reviews} reviews)"))
        }
        (Some(rating), None) => text.push_str(&format!("\n⭐ {rating:.1}/5")),
        _ => {}
    }
    if let Some(price) = payload.price {
        match payload.currency.as_deref() {
            Some(currency) => text.push_str(&format!("\n💰 {price:.2} {currency}")),
            None => text.push_str(&format!("\n💰 {price:.2}")),
        }
    }

    let bullets: Vec<String> = payload
        .features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .take(FEATURE_BULLETS)
        .map(|f| format!("• {f}"))
        .collect();
    if !bullets.is_empty() {
        text.push_str("\n\n");
        text.push_str(&bullets.join("\n"));
    }

    if !final_link.is_empty() {
        text.push_str(&format!("\n\n🔗 {final_link}"));
    }

    truncate_caption(text)
}

fn truncate_caption(text: String) -> String {
    if text.chars().count() <= CAPTION_LIMIT {
        return text;
    }
    let mut cut: String = text.chars().take(CAPTION_LIMIT - 4).collect();
    cut.push_str("...");
    cut
}

/// Numeric ids address chats directly; anything else is a channel username.
pub fn parse_recipient(channel: &str) -> Recipient {
    let channel = channel.trim();
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if channel.starts_with('@') => Recipient::ChannelUsername(channel.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{channel}")),
    }
}

/// A product is only worth posting with a title and a positive price.
pub fn is_postable(payload: &ProductPayload) -> bool {
    !payload.title.trim().is_empty() && payload.price.is_some_and(|p| p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealcast_test_utils::fixtures::candidate;

    fn campaign(name: &str, track_id: Option<&str>) -> Campaign {
        Campaign {
            id: 1,
            name: name.to_string(),
            status: dealcast_core::CampaignStatus::Running,
            channels: vec!["@deals".into()],
            categories: vec!["electronics".into()],
            filters: Default::default(),
            posting_frequency: 0,
            track_id: track_id.map(str::to_string),
            created_by: None,
            last_post_time: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn final_link_adds_campaign_and_tag() {
        let link = build_final_link(
            "https://shop.example/dp/B01",
            &campaign("Summer Sale", Some("deals-21")),
        );
        assert_eq!(
            link,
            "https://shop.example/dp/B01?utm_campaign=Summer_Sale&tag=deals-21"
        );
    }

    #[test]
    fn final_link_extends_existing_query() {
        let link = build_final_link("https://shop.example/dp/B01?th=1", &campaign("x", None));
        assert_eq!(link, "https://shop.example/dp/B01?th=1&utm_campaign=x");
    }

    #[test]
    fn empty_link_stays_empty() {
        assert_eq!(build_final_link("", &campaign("x", Some("t"))), "");
    }

    #[test]
    fn caption_lists_three_features_and_the_link() {
        let mut payload = candidate("B1", None, Some(1)).payload;
        payload.features = vec!["a".into(), " b ".into(), "c".into(), "d".into()];
        let caption = render_caption(&payload, "https://l.example");

        assert!(caption.starts_with(payload.title.trim()));
        assert!(caption.contains("• a\n• b\n• c"));
        assert!(!caption.contains("• d"));
        assert!(caption.ends_with("🔗 https://l.example"));
    }

    #[test]
    fn long_caption_is_truncated() {
        let mut payload = candidate("B1", None, Some(1)).payload;
        payload.title = "x".repeat(2000);
        let caption = render_caption(&payload, "");
        assert_eq!(caption.chars().count(), CAPTION_LIMIT - 1);
        assert!(caption.ends_with("..."));
    }

    #[test]
    fn recipients_parse_as_ids_or_usernames() {
        assert!(matches!(
            parse_recipient("-1001234"),
            Recipient::Id(ChatId(-1001234))
        ));
        assert!(matches!(
            parse_recipient("@deals"),
            Recipient::ChannelUsername(ref u) if u == "@deals"
        ));
        assert!(matches!(
            parse_recipient("deals"),
            Recipient::ChannelUsername(ref u) if u == "@deals"
        ));
    }

    #[test]
    fn postable_requires_title_and_price() {
        let mut payload = candidate("B1", None, Some(1)).payload;
        assert!(is_postable(&payload));
        payload.price = Some(0.0);
        assert!(!is_postable(&payload));
        payload.price = Some(5.0);
        payload.title = "  ".into();
        assert!(!is_postable(&payload));
    }
}
