//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use postwatch::cache::SeenCache;
use postwatch::crawler::{PageFetcher, Pipeline};
use postwatch::notifications::channels::{
    BotIdentity, Channel, ChannelError, ChannelHandle, ChannelResult, DeliveryStatus,
};
use postwatch::notifications::{Dispatcher, OutboundMessage};
use postwatch::parser::PostExtractor;
use postwatch::utils::error::FetchError;

pub const FEED_URL: &str = "https://feed.example.com/member/?uuid=1";

/// Load a fixture from tests/fixtures
pub fn load_fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {path}: {e}"))
}

/// Markup of one post container with a link and body text
pub fn post_html(id: &str, text: &str) -> String {
    format!(
        r#"<div class="social-post">
  <a class="post-link" href="{id}">link</a>
  <div class="post-username">Jane Doe</div>
  <div class="post-content"><p>{text}</p></div>
  <div class="post-date-bottom">July 4, 2025, 9:00 AM</div>
</div>"#
    )
}

/// Full page wrapping containers in document order (newest first)
pub fn page(containers: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><body><main>{}</main></body></html>",
        containers.join("\n")
    )
}

/// Page with one plain container per id, in the given (document) order
pub fn page_of(ids: &[&str]) -> String {
    let containers: Vec<String> = ids.iter().map(|id| post_html(id, "text")).collect();
    page(&containers)
}

/// Fetcher replaying a queue of canned results
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<String, FetchError>>>,
    pub calls: Mutex<usize>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, markup: String) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(markup));
        self
    }

    pub fn push_timeout(&self) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(FetchError::Timeout {
                stage: "waiting for posts",
                secs: 30,
            }));
        self
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Browser("no scripted response".into())))
    }
}

/// Channel recording every accepted message
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<OutboundMessage>>,
    failing: Mutex<HashSet<String>>,
    unresolvable: Mutex<bool>,
    refuse_text: Mutex<bool>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse rich messages for this post id
    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn heal(&self, id: &str) {
        self.failing.lock().unwrap().remove(id);
    }

    /// Refuse every plain-text message, such as video follow-ups
    pub fn set_refuse_text(&self, value: bool) {
        *self.refuse_text.lock().unwrap() = value;
    }

    pub fn set_unresolvable(&self, value: bool) {
        *self.unresolvable.lock().unwrap() = value;
    }

    /// Post ids of accepted rich messages, in send order
    pub fn sent_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::Rich(rich) => rich.url.clone(),
                OutboundMessage::Text(_) => None,
            })
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn wait_until_ready(&self) -> ChannelResult<BotIdentity> {
        Ok(BotIdentity {
            id: "1".into(),
            name: "test-bot".into(),
        })
    }

    async fn resolve_channel(&self, channel_id: &str) -> ChannelResult<ChannelHandle> {
        if *self.unresolvable.lock().unwrap() {
            return Err(ChannelError::NotFound(channel_id.to_string()));
        }
        Ok(ChannelHandle {
            id: channel_id.into(),
            name: Some("alerts".into()),
        })
    }

    async fn send(
        &self,
        _target: &ChannelHandle,
        message: &OutboundMessage,
    ) -> ChannelResult<DeliveryStatus> {
        match message {
            OutboundMessage::Rich(rich) => {
                let id = rich.url.clone().unwrap_or_default();
                if self.failing.lock().unwrap().contains(&id) {
                    return Err(ChannelError::Rejected(format!("refused {id}")));
                }
            }
            OutboundMessage::Text(content) => {
                if *self.refuse_text.lock().unwrap() {
                    return Err(ChannelError::Rejected(format!("refused {content}")));
                }
            }
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(DeliveryStatus::delivered("recording", None))
    }
}

/// Pipeline over the given test doubles
pub fn pipeline(
    fetcher: Arc<ScriptedFetcher>,
    channel: Arc<RecordingChannel>,
    capacity: usize,
) -> Pipeline {
    Pipeline::new(
        fetcher,
        PostExtractor::default(),
        channel,
        Dispatcher::new(SeenCache::new(capacity), "feed.example.com"),
        FEED_URL,
        "1234567890",
    )
}
