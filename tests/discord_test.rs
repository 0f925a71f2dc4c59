//! Integration tests for DiscordChannel using wiremock
//!
//! These tests validate the REST calls against a mock Discord API.

use postwatch::models::{Media, Post};
use postwatch::notifications::channels::{Channel, ChannelError, ChannelHandle};
use postwatch::notifications::{DiscordChannel, DiscordConfig, OutboundMessage};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn channel(server: &MockServer) -> DiscordChannel {
    DiscordChannel::new(
        DiscordConfig::new(TOKEN)
            .with_api_base(server.uri())
            .with_timeout(5)
            .with_max_retries(2)
            .with_ready_backoff_ms(10),
    )
    .unwrap()
}

fn target() -> ChannelHandle {
    ChannelHandle {
        id: "42".to_string(),
        name: Some("alerts".to_string()),
    }
}

fn sample_post() -> Post {
    Post::new("https://social.example.com/p/1", "Feed Member")
        .with_text("Hello from the feed")
        .with_timestamp("July 4, 2025")
        .with_media(Media::Image("https://cdn.example.com/i.jpg".to_string()))
}

/// Readiness succeeds with the bot token in the Authorization header
#[tokio::test]
async fn test_wait_until_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("authorization", "Bot test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "999",
            "username": "postwatch-bot"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = channel(&server).wait_until_ready().await.unwrap();
    assert_eq!(identity.id, "999");
    assert_eq!(identity.name, "postwatch-bot");
}

/// Transient failures are retried until Discord answers
#[tokio::test]
async fn test_wait_until_ready_retries_transient_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "999",
            "username": "postwatch-bot"
        })))
        .mount(&server)
        .await;

    let identity = channel(&server).wait_until_ready().await.unwrap();
    assert_eq!(identity.id, "999");
}

/// A rejected token stops readiness immediately
#[tokio::test]
async fn test_wait_until_ready_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "401: Unauthorized",
            "code": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = channel(&server).wait_until_ready().await.unwrap_err();
    assert!(matches!(err, ChannelError::Unauthorized(_)));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_resolve_channel() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "name": "alerts",
            "type": 0
        })))
        .mount(&server)
        .await;

    let handle = channel(&server).resolve_channel("42").await.unwrap();
    assert_eq!(handle, target());
}

#[tokio::test]
async fn test_resolve_missing_channel() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Unknown Channel",
            "code": 10003
        })))
        .mount(&server)
        .await;

    let err = channel(&server).resolve_channel("404").await.unwrap_err();
    assert!(matches!(err, ChannelError::NotFound(id) if id == "404"));
}

/// Rich messages go out as a single embed with mentions disabled
#[tokio::test]
async fn test_send_rich_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .and(header("authorization", "Bot test-token"))
        .and(body_partial_json(json!({
            "embeds": [{
                "description": "Hello from the feed",
                "color": 0x3498DB,
                "url": "https://social.example.com/p/1",
                "author": { "name": "Feed Member", "url": "https://social.example.com/p/1" },
                "footer": { "text": "Posted: July 4, 2025 | via social.example.com" },
                "image": { "url": "https://cdn.example.com/i.jpg" }
            }],
            "allowed_mentions": { "parse": [] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = OutboundMessage::for_post(&sample_post(), "social.example.com");
    let status = channel(&server).send(&target(), &messages[0]).await.unwrap();
    assert_eq!(status.message_id.as_deref(), Some("m-1"));
}

#[tokio::test]
async fn test_send_text_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .and(body_partial_json(json!({
            "content": "Video from post: https://cdn.example.com/v.mp4"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m-2" })))
        .expect(1)
        .mount(&server)
        .await;

    let message = OutboundMessage::Text("Video from post: https://cdn.example.com/v.mp4".into());
    channel(&server).send(&target(), &message).await.unwrap();
}

/// A 429 is retried after the announced delay
#[tokio::test]
async fn test_send_retries_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "message": "You are being rate limited.",
            "retry_after": 0.01,
            "global": false
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m-3" })))
        .expect(1)
        .mount(&server)
        .await;

    let message = OutboundMessage::Text("hello".into());
    let status = channel(&server).send(&target(), &message).await.unwrap();
    assert_eq!(status.message_id.as_deref(), Some("m-3"));
}

#[tokio::test]
async fn test_send_gives_up_when_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "message": "You are being rate limited.",
            "retry_after": 0.01,
            "global": false
        })))
        .expect(3)
        .mount(&server)
        .await;

    let message = OutboundMessage::Text("hello".into());
    let err = channel(&server).send(&target(), &message).await.unwrap_err();
    assert!(matches!(err, ChannelError::RateLimited(_)));
}

/// Other client errors are reported once and never resent
#[tokio::test]
async fn test_send_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid Form Body",
            "code": 50035
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = OutboundMessage::Text("hello".into());
    let err = channel(&server).send(&target(), &message).await.unwrap_err();
    assert!(matches!(err, ChannelError::Rejected(_)));
    assert!(err.is_recoverable());
}

/// An absurd retry_after is capped instead of aborting the send
#[tokio::test]
async fn test_send_huge_retry_after_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "message": "You are being rate limited.",
            "retry_after": 1e300,
            "global": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = DiscordChannel::new(
        DiscordConfig::new(TOKEN)
            .with_api_base(server.uri())
            .with_timeout(5)
            .with_max_retries(0),
    )
    .unwrap();

    let message = OutboundMessage::Text("hello".into());
    let err = channel.send(&target(), &message).await.unwrap_err();
    assert!(matches!(err, ChannelError::RateLimited(_)));
}
