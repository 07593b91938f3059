//! HTTP fetcher for archived content
//!
//! This module handles all requests to the archive's replay endpoint:
//! - Building the HTTP client with the configured user agent and timeout
//! - Building identity replay URLs (`<endpoint>/<ts>id_/<original>`)
//! - GET requests returning text or raw bytes
//! - Remembering which (timestamp, url) pairs were already fetched
//! - Error classification (logged, never raised)

use crate::config::{Config, UserAgentConfig};
use crate::crawler::discoverer::PageSource;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// How the response body should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Decode the body as text (pages, stylesheets, scripts)
    Text,
    /// Keep the raw bytes (images, fonts, everything else)
    Binary,
}

/// Body of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    /// Raw bytes to write to disk
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(text) => text.into_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    /// Text content, if the body was read as text
    pub fn into_text(self) -> Option<String> {
        match self {
            Content::Text(text) => Some(text),
            Content::Binary(_) => None,
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the resource
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body
        content: Content,
    },

    /// Archive answered with a non-200 status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Per-request timeout in seconds
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use wayback_mirror::config::UserAgentConfig;
/// use wayback_mirror::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "WaybackMirror".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: Some("https://example.com/about".to_string()),
///     contact_email: None,
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// # Outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 200 | Success |
/// | Any other status | HttpError |
/// | Timeout, connection failure, unreadable body | NetworkError |
///
/// No retries are performed.
pub async fn fetch_url(client: &Client, url: &str, kind: ContentKind) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    let content = match kind {
        ContentKind::Text => response.text().await.map(Content::Text),
        ContentKind::Binary => response
            .bytes()
            .await
            .map(|bytes| Content::Binary(bytes.to_vec())),
    };

    match content {
        Ok(content) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content,
        },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}

/// Fetches raw archived content for (timestamp, url) pairs
///
/// Shared by discovery and the asset worker pool; the seen-set is guarded by
/// a mutex so concurrent workers can use one fetcher.
#[derive(Debug)]
pub struct ContentFetcher {
    client: Client,
    replay_endpoint: String,
    seen: Mutex<HashSet<(String, String)>>,
}

impl ContentFetcher {
    /// Creates a fetcher using an existing client
    pub fn new(client: Client, replay_endpoint: impl Into<String>) -> Self {
        Self {
            client,
            replay_endpoint: replay_endpoint.into(),
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Builds the client and fetcher described by the configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout)?;
        Ok(Self::new(client, config.archive.replay_endpoint.clone()))
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Identity replay URL serving the unmodified original resource
    ///
    /// # Examples
    ///
    /// ```
    /// use wayback_mirror::crawler::replay_url;
    ///
    /// assert_eq!(
    ///     replay_url("https://web.archive.org/web/", "20170509211847", "http://example.org/"),
    ///     "https://web.archive.org/web/20170509211847id_/http://example.org/"
    /// );
    /// ```
    pub fn replay_url(&self, timestamp: &str, url: &str) -> String {
        replay_url(&self.replay_endpoint, timestamp, url)
    }

    /// Fetches the archived copy of `url` at `timestamp`
    ///
    /// Returns `None` on any failure, and for a pair already fetched in
    /// this run. Failures are logged here so callers only skip.
    pub async fn fetch(&self, timestamp: &str, url: &str, kind: ContentKind) -> Option<Content> {
        let key = (timestamp.to_string(), url.to_string());
        if self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
        {
            tracing::debug!("Already fetched {} at {}", url, timestamp);
            return None;
        }

        let replay = self.replay_url(timestamp, url);
        tracing::debug!("Fetching {}", replay);

        match fetch_url(&self.client, &replay, kind).await {
            FetchResult::Success { content, .. } => {
                self.seen
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key);
                Some(content)
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Archive returned HTTP {} for {}", status_code, url);
                None
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to fetch {}: {}", url, error);
                None
            }
        }
    }

    /// Returns true if the pair was already fetched successfully
    pub fn was_fetched(&self, timestamp: &str, url: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(timestamp.to_string(), url.to_string()))
    }
}

#[async_trait]
impl PageSource for ContentFetcher {
    async fn fetch_page(&self, timestamp: &str, url: &str) -> Option<String> {
        self.fetch(timestamp, url, ContentKind::Text)
            .await
            .and_then(Content::into_text)
    }
}

/// Joins a replay endpoint, timestamp and original URL
pub fn replay_url(endpoint: &str, timestamp: &str, url: &str) -> String {
    format!("{}/{}id_/{}", endpoint.trim_end_matches('/'), timestamp, url)
}
