//! Discord notification channel
//!
//! Talks to the Discord REST API with a bot token. Readiness is a successful
//! `GET /users/@me`, channel resolution is `GET /channels/{id}`, and delivery
//! is `POST /channels/{id}/messages`.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{BotIdentity, Channel, ChannelError, ChannelHandle, ChannelResult, DeliveryStatus};
use crate::notifications::OutboundMessage;

/// Discord REST API base URL
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Upper bound on a single wait between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Discord channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token (without the `Bot ` prefix)
    pub token: String,
    /// API base URL, overridable for tests
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retries of a rate-limited send
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// First delay between readiness attempts, in milliseconds
    #[serde(default = "default_ready_backoff")]
    pub ready_backoff_ms: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_retries() -> u32 {
    3
}

fn default_ready_backoff() -> u64 {
    1000
}

impl DiscordConfig {
    /// Create a new configuration for a bot token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: default_api_base(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            ready_backoff_ms: default_ready_backoff(),
        }
    }

    /// Set API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first readiness backoff delay
    pub fn with_ready_backoff_ms(mut self, ready_backoff_ms: u64) -> Self {
        self.ready_backoff_ms = ready_backoff_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("Bot token cannot be empty".to_string());
        }

        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err("API base must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    retry_after: f64,
}

/// Discord bot channel
///
/// # Payload Format
///
/// A rich message is sent as a single embed, plain text as `content`.
/// Mentions are never parsed, so scraped text cannot ping anyone:
///
/// ```json
/// {
///   "embeds": [{
///     "description": "post text",
///     "color": 3447003,
///     "url": "https://example.com/p/1",
///     "author": { "name": "Author", "icon_url": "...", "url": "..." },
///     "footer": { "text": "Posted: ... | via example.com" }
///   }],
///   "allowed_mentions": { "parse": [] }
/// }
/// ```
///
/// # Example
///
/// ```rust,ignore
/// use postwatch::notifications::channels::discord::{DiscordChannel, DiscordConfig};
///
/// let channel = DiscordChannel::new(DiscordConfig::new(token))?;
/// let me = channel.wait_until_ready().await?;
/// let target = channel.resolve_channel("123456789").await?;
/// channel.send(&target, &message).await?;
/// ```
pub struct DiscordChannel {
    config: DiscordConfig,
    client: Client,
}

impl DiscordChannel {
    /// Create a new Discord channel
    pub fn new(config: DiscordConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!(
                "DiscordBot (https://github.com/postwatch, {})",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Get the API base URL
    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.config.token)
    }

    /// Build the JSON body for a message
    fn build_payload(message: &OutboundMessage) -> serde_json::Value {
        match message {
            OutboundMessage::Rich(rich) => serde_json::json!({
                "embeds": [rich],
                "allowed_mentions": { "parse": [] },
            }),
            OutboundMessage::Text(content) => serde_json::json!({
                "content": content,
                "allowed_mentions": { "parse": [] },
            }),
        }
    }

    /// Fetch the bot's own identity once
    async fn current_user(&self) -> ChannelResult<BotIdentity> {
        let response = self
            .client
            .get(self.endpoint("/users/@me"))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: UserResponse = response.json().await?;
                Ok(BotIdentity {
                    id: user.id,
                    name: user.username,
                })
            }
            StatusCode::UNAUTHORIZED => Err(ChannelError::Unauthorized(
                "Discord rejected the bot token".to_string(),
            )),
            status => Err(ChannelError::Other(format!(
                "HTTP {status}: {}",
                read_body(response).await
            ))),
        }
    }

    /// Wait a rate-limit interval announced by Discord
    async fn rate_limit_delay(response: Response) -> Duration {
        let header_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());

        let body_secs = response
            .json::<RateLimitResponse>()
            .await
            .ok()
            .map(|body| body.retry_after);

        let secs = body_secs.or(header_secs).unwrap_or(1.0);
        clamp_retry_after(secs)
    }
}

/// Seconds announced by Discord as a sleep bounded by `MAX_BACKOFF`
///
/// Negative and NaN values become zero, huge or infinite ones the cap.
fn clamp_retry_after(secs: f64) -> Duration {
    Duration::from_secs_f64(secs.max(0.0).min(MAX_BACKOFF.as_secs_f64()))
}

fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_BACKOFF)
}

async fn read_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string())
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn wait_until_ready(&self) -> ChannelResult<BotIdentity> {
        let mut delay = Duration::from_millis(self.config.ready_backoff_ms);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.current_user().await {
                Ok(identity) => {
                    tracing::info!(
                        bot = %identity.name,
                        bot_id = %identity.id,
                        attempt,
                        "Logged in to Discord"
                    );
                    return Ok(identity);
                }
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Discord not ready yet"
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_backoff(delay);
                }
            }
        }
    }

    async fn resolve_channel(&self, channel_id: &str) -> ChannelResult<ChannelHandle> {
        let response = self
            .client
            .get(self.endpoint(&format!("/channels/{channel_id}")))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let channel: ChannelResponse = response.json().await?;
                Ok(ChannelHandle {
                    id: channel.id,
                    name: channel.name,
                })
            }
            // A channel the bot cannot see is as good as missing
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                Err(ChannelError::NotFound(channel_id.to_string()))
            }
            StatusCode::UNAUTHORIZED => Err(ChannelError::Unauthorized(
                "Discord rejected the bot token".to_string(),
            )),
            status => Err(ChannelError::Other(format!(
                "HTTP {status}: {}",
                read_body(response).await
            ))),
        }
    }

    async fn send(
        &self,
        target: &ChannelHandle,
        message: &OutboundMessage,
    ) -> ChannelResult<DeliveryStatus> {
        let payload = Self::build_payload(message);
        let url = self.endpoint(&format!("/channels/{}/messages", target.id));

        for attempt in 0..=self.config.max_retries {
            let response = self
                .client
                .post(&url)
                .header(reqwest::header::AUTHORIZATION, self.auth_header())
                .json(&payload)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let message_id = response
                    .json::<MessageResponse>()
                    .await
                    .ok()
                    .map(|m| m.id);

                tracing::debug!(
                    channel = %target,
                    kind = message.kind(),
                    message_id = ?message_id,
                    "Message delivered"
                );
                return Ok(DeliveryStatus::delivered(self.name(), message_id));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = Self::rate_limit_delay(response).await;
                if attempt < self.config.max_retries {
                    tracing::debug!(
                        channel = %target,
                        delay_ms = delay.as_millis() as u64,
                        attempt = attempt + 1,
                        max_attempts = self.config.max_retries + 1,
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                break;
            }

            // Anything else may or may not have been posted; never resend it
            return Err(match status {
                StatusCode::UNAUTHORIZED => ChannelError::Unauthorized(read_body(response).await),
                StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                    ChannelError::NotFound(target.id.clone())
                }
                _ => ChannelError::Rejected(format!("HTTP {status}: {}", read_body(response).await)),
            });
        }

        Err(ChannelError::RateLimited(format!(
            "gave up after {} attempts",
            self.config.max_retries + 1
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Post;
    use crate::notifications::RichMessage;

    #[test]
    fn test_discord_config_validation() {
        assert!(DiscordConfig::new("token").validate().is_ok());
        assert!(DiscordConfig::new("  ").validate().is_err());
        assert!(DiscordConfig::new("token")
            .with_api_base("discord.com/api")
            .validate()
            .is_err());
        assert!(DiscordConfig::new("token").with_timeout(0).validate().is_err());
    }

    #[test]
    fn test_retry_after_clamped() {
        assert_eq!(clamp_retry_after(0.25), Duration::from_millis(250));
        assert_eq!(clamp_retry_after(1e300), MAX_BACKOFF);
        assert_eq!(clamp_retry_after(f64::INFINITY), MAX_BACKOFF);
        assert_eq!(clamp_retry_after(-3.0), Duration::ZERO);
        assert_eq!(clamp_retry_after(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_ready_backoff_saturates() {
        assert_eq!(next_backoff(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::from_secs(45)), MAX_BACKOFF);
        assert_eq!(next_backoff(Duration::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_discord_config_builder() {
        let config = DiscordConfig::new("token")
            .with_api_base("http://localhost:1234/api")
            .with_timeout(30)
            .with_max_retries(5)
            .with_ready_backoff_ms(10);

        assert_eq!(config.api_base, "http://localhost:1234/api");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.ready_backoff_ms, 10);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let channel = DiscordChannel::new(DiscordConfig::new(""));
        assert!(matches!(channel, Err(ChannelError::InvalidConfig(_))));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let channel = DiscordChannel::new(
            DiscordConfig::new("token").with_api_base("http://localhost/api/"),
        )
        .unwrap();
        assert_eq!(channel.endpoint("/users/@me"), "http://localhost/api/users/@me");
        assert_eq!(channel.auth_header(), "Bot token");
    }

    #[test]
    fn test_payload_building() {
        let post = Post::new("https://example.com/p/1", "Jane");
        let rich = OutboundMessage::Rich(RichMessage::from_post(&post, "example.com"));
        let payload = DiscordChannel::build_payload(&rich);
        assert_eq!(payload["embeds"][0]["url"], "https://example.com/p/1");
        assert!(payload["allowed_mentions"]["parse"].as_array().unwrap().is_empty());

        let text = OutboundMessage::Text("Video from post: v.mp4".to_string());
        let payload = DiscordChannel::build_payload(&text);
        assert_eq!(payload["content"], "Video from post: v.mp4");
        assert!(payload.get("embeds").is_none());
    }
}
