//! Path mapping from archived URLs to files under the output root
//!
//! The mapping depends only on the URL's path and query, never on its host,
//! so `http://example.org/a` and `http://www.example.org/a` share a file and a
//! path can be computed before (or without) the resource being fetched.

mod dispatch;

pub use dispatch::{
    action_param, convert_dynamic_link, decode_segments, query_hash, sanitize_action,
    strip_dynamic_extension, DispatchPattern, DYNAMIC_EXTENSIONS,
};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};
use url::Url;

/// Base used to give relative references a path and query
static PLACEHOLDER_BASE: LazyLock<Option<Url>> =
    LazyLock::new(|| Url::parse("http://placeholder.invalid/").ok());

/// Maps URLs to local paths and remembers generated dispatch file names
#[derive(Debug)]
pub struct PathMapper {
    output_root: PathBuf,
    dispatch: RwLock<HashMap<DispatchPattern, String>>,
}

impl PathMapper {
    /// Creates a mapper rooted at the given output directory
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            dispatch: RwLock::new(HashMap::new()),
        }
    }

    /// The output root all local paths live under
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Maps a URL to its file under the output root
    ///
    /// # Mapping Rules
    ///
    /// 1. Empty paths become `index.html`
    /// 2. A last segment without a dot is a directory: `/index.html` is appended
    /// 3. With a query string:
    ///    - a dispatch script (`dir/index.php?action=X`) becomes `dir/X.html`
    ///      (sanitized) and the pattern is remembered
    ///    - any other query adds `_<hash8>` before the extension
    /// 4. A remaining dynamic-script extension becomes `.html`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use wayback_mirror::PathMapper;
    ///
    /// let mapper = PathMapper::new("out");
    /// assert_eq!(
    ///     mapper.url_to_local_path("http://example.org/sub/index.php?action=events"),
    ///     Path::new("out/sub/events.html")
    /// );
    /// assert_eq!(
    ///     mapper.url_to_local_path("http://example.org/about"),
    ///     Path::new("out/about/index.html")
    /// );
    /// ```
    pub fn url_to_local_path(&self, url: &str) -> PathBuf {
        self.output_root.join(self.site_relative_path(url))
    }

    /// Same as [`url_to_local_path`](Self::url_to_local_path), relative to the output root
    pub fn site_relative_path(&self, url: &str) -> String {
        let Some(parsed) = parse_reference(url) else {
            return "index.html".to_string();
        };

        let segments = decode_segments(parsed.path());
        let mut path = match segments.last() {
            None => "index.html".to_string(),
            Some(last) if !last.contains('.') => format!("{}/index.html", segments.join("/")),
            Some(_) => segments.join("/"),
        };

        if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
            match DispatchPattern::from_parts(parsed.path(), query) {
                Some(pattern) => path = self.remember_dispatch(pattern),
                None => path = insert_before_extension(&path, &format!("_{}", query_hash(query))),
            }
        }

        match strip_dynamic_extension(&path) {
            Some(stem) => format!("{}.html", stem),
            None => path,
        }
    }

    /// Returns the path a dynamic-script URL with a query maps to
    ///
    /// Dispatch URLs consult the remembered pattern first and otherwise derive
    /// the same name [`url_to_local_path`](Self::url_to_local_path) would, so both
    /// functions agree for any URL. Returns `None` if the URL is not a
    /// dynamic-script path or has no query.
    pub fn convert_dispatch_url_to_path(&self, url: &str) -> Option<PathBuf> {
        let parsed = parse_reference(url)?;
        let query = parsed.query().filter(|q| !q.is_empty())?;
        strip_dynamic_extension(parsed.path())?;

        match DispatchPattern::from_parts(parsed.path(), query) {
            Some(pattern) => {
                let cached = self
                    .dispatch
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&pattern)
                    .cloned();
                Some(
                    self.output_root
                        .join(cached.unwrap_or_else(|| pattern.local_path())),
                )
            }
            None => Some(self.url_to_local_path(url)),
        }
    }

    /// Number of dispatch patterns seen so far
    pub fn dispatch_mappings(&self) -> usize {
        self.dispatch
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn remember_dispatch(&self, pattern: DispatchPattern) -> String {
        let mut cache = self
            .dispatch
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let local = pattern.local_path();
        cache.entry(pattern).or_insert(local).clone()
    }
}

/// Parses an absolute URL, or a relative reference against a placeholder host
fn parse_reference(url: &str) -> Option<Url> {
    Url::parse(url)
        .ok()
        .or_else(|| PLACEHOLDER_BASE.as_ref()?.join(url).ok())
}

/// Inserts `suffix` between a path's file stem and its extension
fn insert_before_extension(path: &str, suffix: &str) -> String {
    let file_start = path.rfind('/').map_or(0, |idx| idx + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = file_start + dot;
            format!("{}{}{}", &path[..dot], suffix, &path[dot..])
        }
        _ => format!("{}{}", path, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> PathMapper {
        PathMapper::new("out")
    }

    #[test]
    fn test_root_maps_to_index() {
        let mapper = mapper();
        assert_eq!(
            mapper.site_relative_path("http://www.example.org/"),
            "index.html"
        );
        assert_eq!(mapper.site_relative_path("http://www.example.org"), "index.html");
    }

    #[test]
    fn test_plain_files_and_directories() {
        let mapper = mapper();
        assert_eq!(
            mapper.site_relative_path("http://example.org/css/style.css"),
            "css/style.css"
        );
        assert_eq!(
            mapper.site_relative_path("http://example.org/about"),
            "about/index.html"
        );
        assert_eq!(
            mapper.site_relative_path("http://example.org/about/"),
            "about/index.html"
        );
        assert_eq!(
            mapper.site_relative_path("http://example.org/files/my%20doc.pdf"),
            "files/my doc.pdf"
        );
    }

    #[test]
    fn test_host_does_not_affect_path() {
        let mapper = mapper();
        assert_eq!(
            mapper.url_to_local_path("http://example.org/page.html"),
            mapper.url_to_local_path("https://www.example.org/page.html")
        );
    }

    #[test]
    fn test_dispatch_url() {
        let mapper = mapper();
        assert_eq!(
            mapper.site_relative_path("http://example.org/index.php?action=events"),
            "events.html"
        );
        assert_eq!(
            mapper.site_relative_path("http://example.org/sub/index.php?action=events"),
            "sub/events.html"
        );
        assert_eq!(
            mapper.site_relative_path("http://example.org/index.php?action=foo%20bar"),
            "foo_bar.html"
        );
        assert_eq!(mapper.dispatch_mappings(), 3);
    }

    #[test]
    fn test_dynamic_script_without_query() {
        let mapper = mapper();
        assert_eq!(
            mapper.site_relative_path("http://example.org/contact.php"),
            "contact.html"
        );
        assert_eq!(mapper.dispatch_mappings(), 0);
    }

    #[test]
    fn test_other_query_gets_hash_suffix() {
        let mapper = mapper();
        let hash = query_hash("foo=bar");
        assert_eq!(
            mapper.site_relative_path("http://example.org/page.php?foo=bar"),
            format!("page_{}.html", hash)
        );
        assert_eq!(
            mapper.site_relative_path("http://example.org/gallery.html?foo=bar"),
            format!("gallery_{}.html", hash)
        );
        assert_eq!(
            mapper.site_relative_path("http://example.org/about?foo=bar"),
            format!("about/index_{}.html", hash)
        );
    }

    #[test]
    fn test_distinct_queries_do_not_collide() {
        let mapper = mapper();
        assert_ne!(
            mapper.url_to_local_path("http://example.org/list.php?page=1"),
            mapper.url_to_local_path("http://example.org/list.php?page=2")
        );
    }

    #[test]
    fn test_dispatch_round_trip_agrees() {
        let mapper = mapper();
        let urls = [
            "http://example.org/index.php?action=events",
            "http://example.org/sub/index.php?action=news&lang=en",
            "http://example.org/page.php?foo=bar",
        ];

        for url in urls {
            let before = mapper.convert_dispatch_url_to_path(url);
            let mapped = mapper.url_to_local_path(url);
            let after = mapper.convert_dispatch_url_to_path(url);
            assert_eq!(before.as_deref(), Some(mapped.as_path()), "{}", url);
            assert_eq!(after.as_deref(), Some(mapped.as_path()), "{}", url);
        }
        assert_eq!(
            mapper.url_to_local_path("http://example.org/index.php?action=events"),
            Path::new("out/events.html")
        );
    }

    #[test]
    fn test_convert_dispatch_rejects_non_dynamic_or_queryless() {
        let mapper = mapper();
        assert_eq!(
            mapper.convert_dispatch_url_to_path("http://example.org/contact.php"),
            None
        );
        assert_eq!(
            mapper.convert_dispatch_url_to_path("http://example.org/page.html?x=1"),
            None
        );
        assert_eq!(mapper.convert_dispatch_url_to_path("http://example.org/"), None);
    }

    #[test]
    fn test_every_local_path_has_extension() {
        let mapper = mapper();
        for url in [
            "http://example.org/",
            "http://example.org/a/b/c",
            "http://example.org/x.php?y=1",
            "http://example.org/index.php?action=z",
        ] {
            let path = mapper.url_to_local_path(url);
            assert!(path.extension().is_some(), "{:?}", path);
        }
    }

    #[test]
    fn test_insert_before_extension() {
        assert_eq!(insert_before_extension("a/b.html", "_x"), "a/b_x.html");
        assert_eq!(insert_before_extension("a.b/c", "_x"), "a.b/c_x");
        assert_eq!(insert_before_extension("a/.hidden", "_x"), "a/.hidden_x");
    }
}
