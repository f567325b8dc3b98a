//! Elmo: a page-asset auditor
//!
//! This crate downloads a root page, discovers the sub-resources it references
//! (images, scripts, embeds, stylesheets, inline background images, inputs),
//! fetches them under a bounded concurrency limit and aggregates timing and
//! size statistics for reporting or monitoring.

pub mod audit;
pub mod config;
pub mod output;
pub mod stats;
pub mod url;

use thiserror::Error;

/// Main error type for audit runs
///
/// Every variant is fatal to the run. Per-asset failures never surface here,
/// they are counted by the scheduler instead.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch root page {url}: {source}")]
    RootFetch { url: String, source: FetchError },

    #[error("Keyword '{keyword}' not found in {url}")]
    KeywordMissing { url: String, keyword: String },

    #[error("URL parse error: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by a single GET request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    /// Classifies a reqwest send error, keeping timeouts distinct
    pub fn from_send(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    /// The URL the failed request targeted
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Timeout { url } | Self::Body { url, .. } => url,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Reference resolution errors
///
/// These are warnings: the offending reference is dropped and extraction goes on.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse reference '{reference}': {source}")]
    Parse {
        reference: String,
        source: ::url::ParseError,
    },

    #[error("Unsupported scheme in '{0}'")]
    UnsupportedScheme(String),

    #[error("Empty reference")]
    Empty,
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::{run_audit, AuditReport};
pub use config::Config;
pub use stats::{AggregateStatistic, Aggregator, ResourceStatistic};
pub use crate::url::{is_allowed, resolve_reference, DomainFilter};
