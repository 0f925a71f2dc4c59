//! Notification channels for delivering posts
//!
//! A [`Channel`] is the transport the pipeline talks to: it reports when it
//! is ready, resolves a configured channel id to a sendable handle, and
//! delivers one message at a time.

pub mod discord;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::notifications::OutboundMessage;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Target channel could not be resolved
    #[error("Channel not found: {0}")]
    NotFound(String),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Message rejected by the remote end
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

impl ChannelError {
    /// Check if retrying later can succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Unauthorized(_) | Self::InvalidConfig(_))
    }
}

/// Identity the transport is connected as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
}

/// A resolved, sendable destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    pub id: String,
    pub name: Option<String>,
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "#{name} ({})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Receipt for a delivered message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Channel that delivered the message
    pub channel: String,
    /// Remote message id, if the transport returns one
    pub message_id: Option<String>,
    /// Timestamp of delivery
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a delivery receipt
    pub fn delivered(channel: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            channel: channel.into(),
            message_id,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[DELIVERED] {}", self.channel)?;
        if let Some(id) = &self.message_id {
            write!(f, ": {id}")?;
        }
        Ok(())
    }
}

/// Trait for notification channels
///
/// Implement this trait to plug in another transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Block until the transport is connected and authenticated
    async fn wait_until_ready(&self) -> ChannelResult<BotIdentity>;

    /// Resolve a configured channel id to a handle
    ///
    /// Returns [`ChannelError::NotFound`] when the id does not resolve.
    async fn resolve_channel(&self, channel_id: &str) -> ChannelResult<ChannelHandle>;

    /// Deliver one message
    async fn send(
        &self,
        target: &ChannelHandle,
        message: &OutboundMessage,
    ) -> ChannelResult<DeliveryStatus>;
}
