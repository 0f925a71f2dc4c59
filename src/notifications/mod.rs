//! Post notification system
//!
//! This module turns extracted posts into outbound messages and delivers
//! them through a notification channel.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │      Dispatcher                            │
//! │  - Seen-id filtering (SeenCache)           │
//! │  - Post → message conversion               │
//! │  - Ordered delivery, record on success     │
//! └────────────────────────────────────────────┘
//!                     │
//!                     ▼
//!               ┌──────────┐
//!               │ Channel  │  (Discord, or any impl)
//!               └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use postwatch::cache::SeenCache;
//! use postwatch::notifications::{Dispatcher, DiscordChannel, DiscordConfig, Channel};
//!
//! let channel = DiscordChannel::new(DiscordConfig::new(token))?;
//! channel.wait_until_ready().await?;
//! let target = channel.resolve_channel("123456789").await?;
//!
//! let mut dispatcher = Dispatcher::new(SeenCache::new(50), "civictracker.us");
//! let report = dispatcher.dispatch(&channel, &target, &posts).await;
//! ```

pub mod channels;
pub mod dispatcher;
pub mod message;

// Re-exports
pub use channels::discord::{DiscordChannel, DiscordConfig};
pub use channels::{BotIdentity, Channel, ChannelError, ChannelHandle, DeliveryStatus};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use message::{OutboundMessage, RichMessage};
