//! Configuration module for Wayback-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use wayback_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirroring {} at {}", config.site.domain, config.site.snapshot);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig,
    DEFAULT_INDEX_ENDPOINT, DEFAULT_REPLAY_ENDPOINT,
};

// Re-export parser functions
pub use parser::{load_config, override_output_directory, parse_config};
pub use validation::validate;
