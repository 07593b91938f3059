use serde::Deserialize;

/// Default Wayback Machine CDX search endpoint
pub const DEFAULT_INDEX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

/// Default Wayback Machine replay endpoint
pub const DEFAULT_REPLAY_ENDPOINT: &str = "https://web.archive.org/web";

/// Main configuration structure for Wayback-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    pub output: OutputConfig,
}

/// The archived site being mirrored
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Apex domain of the site (e.g., "example.org")
    pub domain: String,

    /// Page the mirror must always contain, used as the redirect target
    #[serde(rename = "entry-url")]
    pub entry_url: String,

    /// Archive timestamp of the snapshot to mirror (YYYYMMDD[hhmmss])
    pub snapshot: String,

    /// Human-readable site name used in the redirect page title
    #[serde(default)]
    pub title: Option<String>,
}

impl SiteConfig {
    /// Returns the configured title, falling back to the domain
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.domain)
    }
}

/// Crawl limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Hard cap on successfully fetched pages
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Number of concurrent asset downloads
    #[serde(rename = "asset-workers", default = "default_asset_workers")]
    pub asset_workers: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Whether off-site assets with a known asset extension are downloaded too
    #[serde(rename = "mirror-external-assets", default = "default_true")]
    pub mirror_external_assets: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            asset_workers: default_asset_workers(),
            request_timeout: default_request_timeout(),
            mirror_external_assets: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesised part omitted when no contact details are configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = self
            .contact_url
            .iter()
            .map(|url| format!("+{}", url))
            .chain(self.contact_email.iter().cloned())
            .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Archive host endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// CDX search endpoint used to enumerate captured pages
    #[serde(rename = "index-endpoint", default = "default_index_endpoint")]
    pub index_endpoint: String,

    /// Replay endpoint prefix; raw captures live at `<prefix>/<ts>id_/<url>`
    #[serde(rename = "replay-endpoint", default = "default_replay_endpoint")]
    pub replay_endpoint: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            index_endpoint: default_index_endpoint(),
            replay_endpoint: default_replay_endpoint(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the generated static site
    pub directory: String,
}

fn default_max_pages() -> usize {
    500
}

fn default_asset_workers() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_index_endpoint() -> String {
    DEFAULT_INDEX_ENDPOINT.to_string()
}

fn default_replay_endpoint() -> String {
    DEFAULT_REPLAY_ENDPOINT.to_string()
}
