//! Wayback-Mirror: rebuilds an archived website snapshot as a static site
//!
//! This crate pulls a historical snapshot of a single website out of the
//! Wayback Machine, discovers its page and asset graph, maps the original URL
//! space onto a local file tree and rewrites every reference so the result
//! can be browsed offline.

pub mod config;
pub mod crawler;
pub mod html;
pub mod mapper;
pub mod output;
pub mod rewrite;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Wayback-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Archive index error: {0}")]
    Index(String),

    #[error("Invalid state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: state::PageState,
        to: state::PageState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

    #[error("Invalid domain: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Wayback-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use mapper::PathMapper;
pub use state::{PageRecord, PageState, UrlTable};
pub use url::{classify_and_unwrap, resolve, SiteScope};
