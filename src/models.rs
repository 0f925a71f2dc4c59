//! Core data structures shared across the pipeline

use serde::{Deserialize, Serialize};

/// Text used when a post has no body content
pub const NO_TEXT_CONTENT: &str = "No text content.";

/// Timestamp used when a post carries no display date
pub const TIMESTAMP_UNAVAILABLE: &str = "Timestamp not available.";

/// Media attached to a post (at most one item)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "url", rename_all = "lowercase")]
pub enum Media {
    /// No media
    #[default]
    None,
    /// Inline image URL
    Image(String),
    /// Video source URL
    Video(String),
}

impl Media {
    /// Check whether the post carries no media
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Image URL, if the media is an image
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Image(url) => Some(url),
            _ => None,
        }
    }

    /// Video URL, if the media is a video
    #[must_use]
    pub fn video_url(&self) -> Option<&str> {
        match self {
            Self::Video(url) => Some(url),
            _ => None,
        }
    }
}

/// One post extracted from a rendered feed page
///
/// Rebuilt from markup on every cycle and never persisted. The `id` is the
/// canonical link of the original post and identifies it across cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Canonical URL of the original post
    pub id: String,

    /// Normalized body text
    pub text: String,

    /// Author-supplied display timestamp
    pub timestamp: String,

    /// Display name of the author
    pub author_name: String,

    /// Avatar image of the author
    pub author_avatar_url: Option<String>,

    /// Attached media
    pub media: Media,
}

impl Post {
    /// Create a post with default values for every optional field
    pub fn new(id: impl Into<String>, author_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: NO_TEXT_CONTENT.to_string(),
            timestamp: TIMESTAMP_UNAVAILABLE.to_string(),
            author_name: author_name.into(),
            author_avatar_url: None,
            media: Media::None,
        }
    }

    /// Set body text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set display timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Set media
    pub fn with_media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    /// Set avatar URL
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.author_avatar_url = Some(url.into());
        self
    }
}
