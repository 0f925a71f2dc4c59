//! Outbound notification payloads
//!
//! A post becomes one rich message (an embed) and, when it carries a video,
//! a follow-up plain-text message with the video link. The embed layout
//! serializes directly to Discord's embed object.

use serde::{Deserialize, Serialize};

use crate::models::Post;
use crate::utils::truncate_text;

/// Embed accent colour (Discord's "blue")
pub const EMBED_COLOR: u32 = 0x3498DB;

/// Maximum embed description length accepted by Discord
pub const MAX_DESCRIPTION_CHARS: usize = 4096;

/// Maximum author name length accepted by Discord
pub const MAX_AUTHOR_CHARS: usize = 256;

/// Maximum footer length accepted by Discord
pub const MAX_FOOTER_CHARS: usize = 2048;

/// Attribution block of a rich message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Footer block of a rich message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Inline image of a rich message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

/// Rich message (embed) payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
}

impl RichMessage {
    /// Build the primary message for a post
    ///
    /// `source` names where the post was found and ends up in the footer.
    #[must_use]
    pub fn from_post(post: &Post, source: &str) -> Self {
        Self {
            title: None,
            description: truncate_text(&post.text, MAX_DESCRIPTION_CHARS),
            color: EMBED_COLOR,
            url: Some(post.id.clone()),
            author: Some(EmbedAuthor {
                name: truncate_text(&post.author_name, MAX_AUTHOR_CHARS),
                icon_url: post.author_avatar_url.clone(),
                url: Some(post.id.clone()),
            }),
            footer: Some(EmbedFooter {
                text: truncate_text(
                    &format!("Posted: {} | via {source}", post.timestamp),
                    MAX_FOOTER_CHARS,
                ),
            }),
            image: post.media.image_url().map(|url| EmbedImage {
                url: url.to_string(),
            }),
        }
    }
}

/// A single message handed to a notification channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Rich message with attribution, body, footer and optional image
    Rich(RichMessage),
    /// Plain text message
    Text(String),
}

impl OutboundMessage {
    /// Build every message for a post, in send order
    ///
    /// The primary rich message always comes first; a video adds a second,
    /// plain-text message carrying the video link.
    #[must_use]
    pub fn for_post(post: &Post, source: &str) -> Vec<Self> {
        let mut messages = vec![Self::Rich(RichMessage::from_post(post, source))];

        if let Some(video) = post.media.video_url() {
            messages.push(Self::Text(format!("Video from post: {video}")));
        }

        messages
    }

    /// Short label for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rich(_) => "rich",
            Self::Text(_) => "text",
        }
    }
}
