//! Unified error handling for the postwatch crate
//!
//! Each stage keeps its own error enum; [`Error`] wraps them so the
//! pipeline and scheduler can log and classify any failure uniformly.
//!
//! # Architecture
//!
//! - [`PostwatchErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use postwatch::error::{Error, PostwatchErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "Cycle skipped: {err}");
//!     } else {
//!         tracing::error!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::config::ConfigError;
pub use crate::notifications::ChannelError;
pub use crate::utils::error::{ExtractError, FetchError};

/// Common trait for all postwatch error types
pub trait PostwatchErrorTrait: std::error::Error {
    /// Check if this error is recoverable (the next cycle may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Page rendering and HTTP transport errors
    Network,
    /// Markup and data extraction errors
    Parsing,
    /// Notification channel errors
    Delivery,
    /// Configuration and credential errors
    Config,
    /// Scheduler and task errors
    Scheduler,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short lowercase label for logs and metrics
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Delivery => "delivery",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PostwatchErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Worker(_) => ErrorCategory::Scheduler,
            _ => ErrorCategory::Network,
        }
    }
}

impl PostwatchErrorTrait for ExtractError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl PostwatchErrorTrait for ChannelError {
    fn is_recoverable(&self) -> bool {
        ChannelError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::InvalidConfig(_) => ErrorCategory::Config,
            Self::HttpError(_) => ErrorCategory::Network,
            _ => ErrorCategory::Delivery,
        }
    }
}

impl PostwatchErrorTrait for ConfigError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Config
    }
}

/// Unified error type for the postwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Page render errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Post extraction errors
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Notification channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PostwatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Extract(e) => PostwatchErrorTrait::is_recoverable(e),
            Self::Channel(e) => e.is_recoverable(),
            Self::Config(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Task(_) => true,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Extract(e) => e.category(),
            Self::Channel(e) => PostwatchErrorTrait::category(e),
            Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Other,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Task(_) => ErrorCategory::Scheduler,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The configured channel did not resolve
    #[must_use]
    pub fn is_channel_unavailable(&self) -> bool {
        matches!(self, Self::Channel(ChannelError::NotFound(_)))
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
