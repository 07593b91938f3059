//! URL handling module for Wayback-Mirror
//!
//! This module provides archive un-wrapping, reference resolution, site scope
//! checks and asset classification.

mod domain;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::{extract_domain, host_in_domain, SiteScope};
pub use normalize::{
    canonicalize, classify_and_unwrap, is_absolute_http, resolve, split_fragment,
    unwrap_archive_urls,
};

/// Host serving the archived snapshots
pub const ARCHIVE_HOST: &str = "web.archive.org";

/// Extensions of files that are downloaded as assets and never crawled as pages
pub const ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "eot", "otf",
    "webp", "mp4", "webm", "pdf", "json", "xml", "map",
];

/// Returns the lowercase extension of the last segment of a URL path
///
/// A leading dot (`.htaccess`) does not count as an extension.
pub fn path_extension(path: &str) -> Option<String> {
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    match segment.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < segment.len() => {
            Some(segment[idx + 1..].to_ascii_lowercase())
        }
        _ => None,
    }
}

/// Returns true if the URL's path ends in a known asset extension
///
/// # Examples
///
/// ```
/// use wayback_mirror::url::has_asset_extension;
///
/// assert!(has_asset_extension("http://example.org/css/site.CSS"));
/// assert!(!has_asset_extension("http://example.org/index.php?action=a.css"));
/// ```
pub fn has_asset_extension(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };

    path_extension(&path).is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns true if the URL is served by the archive host itself
pub fn is_archive_host_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| extract_domain(&parsed))
        .is_some_and(|host| host_in_domain(&host, "archive.org"))
}
