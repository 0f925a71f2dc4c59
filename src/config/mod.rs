//! Configuration management for postwatch
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables (a `.env` file is honoured). Secrets such as
//! the bot token normally only come from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::notifications::channels::discord::DEFAULT_API_BASE;
use crate::parser::{DEFAULT_AUTHOR, DEFAULT_MAX_POSTS};

/// Page watched when no URL is configured
pub const DEFAULT_TARGET_URL: &str =
    "https://civictracker.us/executive/member/?uuid=3094abf7-4a95-4b8d-8c8d-af7d1c3747a1";

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent or empty
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A setting has an unusable value
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Failed to parse TOML config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page to watch and how to read it
    pub target: TargetConfig,

    /// Discord connection
    pub discord: DiscordSettings,

    /// Headless browser settings
    pub browser: BrowserSettings,

    /// Cycle loop settings
    pub watch: WatchConfig,

    /// Health server settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Watched page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// URL of the rendered feed page
    pub url: String,

    /// Author name used when a post has none
    pub default_author: String,

    /// Number of newest post containers read per cycle
    pub max_posts: usize,
}

/// Discord configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Bot token
    #[serde(skip_serializing)]
    pub bot_token: String,

    /// Target channel id
    pub channel_id: String,

    /// REST API base URL
    pub api_base: String,
}

/// Browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Explicit Chromium executable; autodetected when unset
    pub chrome_path: Option<String>,

    /// Pass `--no-sandbox` (needed in most containers)
    pub no_sandbox: bool,

    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,

    /// Wait for the first post container, in seconds
    pub selector_timeout_secs: u64,
}

/// Cycle loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Period between cycle starts in seconds
    pub interval_secs: u64,

    /// Number of dispatched ids remembered
    pub cache_capacity: usize,

    /// Give up on a post after this many failed cycles; unset retries forever
    pub max_delivery_attempts: Option<u32>,
}

/// Health server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_TARGET_URL),
            default_author: String::from(DEFAULT_AUTHOR),
            max_posts: DEFAULT_MAX_POSTS,
        }
    }
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            api_base: String::from(DEFAULT_API_BASE),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            no_sandbox: false,
            navigation_timeout_secs: 60,
            selector_timeout_secs: 30,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            cache_capacity: crate::cache::DEFAULT_CAPACITY,
            max_delivery_attempts: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` first if present. Does not validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// Sections and keys missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from an optional file, then apply environment overrides
    ///
    /// Does not validate; callers pick [`Config::validate`] or
    /// [`Config::validate_limits`] depending on what they need.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables that are set
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(token) = env_string("BOT_TOKEN") {
            self.discord.bot_token = token;
        }
        if let Some(channel_id) = env_string("CHANNEL_ID") {
            self.discord.channel_id = channel_id;
        }
        if let Some(api_base) = env_string("DISCORD_API_BASE") {
            self.discord.api_base = api_base;
        }

        if let Some(url) = env_string("POSTWATCH_URL") {
            self.target.url = url;
        }
        if let Some(author) = env_string("POSTWATCH_DEFAULT_AUTHOR") {
            self.target.default_author = author;
        }
        if let Some(max_posts) = env_parse("POSTWATCH_MAX_POSTS")? {
            self.target.max_posts = max_posts;
        }

        if let Some(path) = env_string("POSTWATCH_CHROME_PATH") {
            self.browser.chrome_path = Some(path);
        }
        if let Some(no_sandbox) = env_parse("POSTWATCH_NO_SANDBOX")? {
            self.browser.no_sandbox = no_sandbox;
        }
        if let Some(secs) = env_parse("POSTWATCH_NAVIGATION_TIMEOUT_SECS")? {
            self.browser.navigation_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("POSTWATCH_SELECTOR_TIMEOUT_SECS")? {
            self.browser.selector_timeout_secs = secs;
        }

        if let Some(secs) = env_parse("POSTWATCH_INTERVAL_SECS")? {
            self.watch.interval_secs = secs;
        }
        if let Some(capacity) = env_parse("POSTWATCH_CACHE_CAPACITY")? {
            self.watch.cache_capacity = capacity;
        }
        if let Some(attempts) = env_parse("POSTWATCH_MAX_DELIVERY_ATTEMPTS")? {
            self.watch.max_delivery_attempts = Some(attempts);
        }

        if let Some(port) = env_parse("PORT")? {
            self.server.port = port;
        }

        if let Some(level) = env_string("POSTWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_string("POSTWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token().is_empty() {
            return Err(ConfigError::Missing("BOT_TOKEN"));
        }

        let channel_id = self.channel_id();
        if channel_id.is_empty() {
            return Err(ConfigError::Missing("CHANNEL_ID"));
        }
        if !channel_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::invalid(
                "CHANNEL_ID",
                format!("expected a numeric id, got {channel_id:?}"),
            ));
        }

        url::Url::parse(&self.target.url)
            .map_err(|e| ConfigError::invalid("POSTWATCH_URL", e.to_string()))?;
        url::Url::parse(&self.discord.api_base)
            .map_err(|e| ConfigError::invalid("DISCORD_API_BASE", e.to_string()))?;

        self.validate_limits()
    }

    /// Validate the numeric settings only
    ///
    /// Used by commands that never talk to Discord.
    pub fn validate_limits(&self) -> Result<(), ConfigError> {
        if self.watch.interval_secs == 0 {
            return Err(ConfigError::invalid(
                "POSTWATCH_INTERVAL_SECS",
                "must be greater than 0",
            ));
        }

        if self.watch.cache_capacity == 0 {
            return Err(ConfigError::invalid(
                "POSTWATCH_CACHE_CAPACITY",
                "must be greater than 0",
            ));
        }

        if self.target.max_posts == 0 {
            return Err(ConfigError::invalid(
                "POSTWATCH_MAX_POSTS",
                "must be greater than 0",
            ));
        }

        if self.browser.navigation_timeout_secs == 0 || self.browser.selector_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "POSTWATCH_*_TIMEOUT_SECS",
                "timeouts must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Bot token without surrounding whitespace
    pub fn bot_token(&self) -> &str {
        self.discord.bot_token.trim()
    }

    /// Target channel id without surrounding whitespace
    pub fn channel_id(&self) -> &str {
        self.discord.channel_id.trim()
    }

    /// Get the cycle period as Duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.watch.interval_secs)
    }

    /// Get the navigation timeout as Duration
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.browser.navigation_timeout_secs)
    }

    /// Get the post container wait as Duration
    #[must_use]
    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.browser.selector_timeout_secs)
    }

    /// Host of the watched page, shown in message footers
    #[must_use]
    pub fn source_label(&self) -> String {
        crate::utils::extract_domain(&self.target.url).unwrap_or_else(|_| self.target.url.clone())
    }
}

/// Read a non-empty environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable if set
fn env_parse<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, format!("{raw:?}: {e}"))),
        None => Ok(None),
    }
}
