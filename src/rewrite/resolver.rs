//! Per-reference resolution shared by attribute, `srcset` and CSS rewriting

use crate::mapper::{convert_dynamic_link, PathMapper};
use crate::state::UrlTable;
use crate::url::{canonicalize, classify_and_unwrap, is_absolute_http, resolve, split_fragment, SiteScope};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

/// `scheme://name.html`: a local page that gained a scheme and lost its path
static SCHEMED_LOCAL_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://[^/?#]+\.html(?:[?#].*)?$").expect("local page pattern is valid")
});

/// `//name.html`: a protocol-relative link that is really a local page
static PROTOCOL_RELATIVE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^//[^/?#]+\.html(?:[?#].*)?$").expect("protocol-relative pattern is valid")
});

/// Resolves references found in one file to their rewritten form
///
/// The same resolver instance serves every reference of a file, so
/// attributes, `srcset` candidates and CSS `url(...)` values are treated
/// identically.
#[derive(Debug)]
pub struct LinkResolver<'a> {
    table: &'a UrlTable,
    mapper: &'a PathMapper,
    scope: &'a SiteScope,
    file_dir: PathBuf,
    base: Option<Url>,
}

impl<'a> LinkResolver<'a> {
    /// Creates a resolver for the file at `local_path`
    ///
    /// # Arguments
    ///
    /// * `table` - Global URL table (read-only during rewriting)
    /// * `mapper` - Path mapper holding the dispatch cache
    /// * `scope` - The mirrored site
    /// * `local_path` - The file whose references are resolved
    /// * `base_url` - Canonical URL of the file, if known
    pub fn new(
        table: &'a UrlTable,
        mapper: &'a PathMapper,
        scope: &'a SiteScope,
        local_path: &Path,
        base_url: Option<&str>,
    ) -> Self {
        Self {
            table,
            mapper,
            scope,
            file_dir: local_path.parent().map(Path::to_path_buf).unwrap_or_default(),
            base: base_url.and_then(|url| Url::parse(url).ok()),
        }
    }

    /// Returns the rewritten form of a reference, or `None` to leave it as is
    ///
    /// # Resolution
    ///
    /// 1. Non-fetchable references (`mailto:`, anchors, ...) are left alone
    /// 2. Archive wrapping is removed
    /// 3. A URL with a local copy becomes a path relative to this file
    /// 4. Other on-site URLs use the dispatch mapping when one applies and
    ///    otherwise fall back to the URL path
    /// 5. Off-site URLs keep their un-wrapped absolute form
    ///
    /// Malformed-link fixups, dynamic-script renaming and root-absolute path
    /// conversion run afterwards. Fragments are preserved.
    pub fn resolve(&self, value: &str) -> Option<String> {
        let (body, fragment) = split_fragment(value.trim());
        if body.is_empty() {
            return None;
        }
        // Protocol-relative local links must collapse before a scheme is added
        let body = if body.starts_with("//") {
            fix_protocol_and_local_links(body)
        } else {
            body.to_string()
        };
        let clean = classify_and_unwrap(&body)?;

        let link = self.locate(&clean);
        let link = fix_protocol_and_local_links(&link);
        let link = if is_absolute_http(&link) {
            link
        } else {
            convert_dynamic_link(&link).unwrap_or(link)
        };
        let link = self.root_absolute_to_relative(&link).unwrap_or(link);

        Some(match fragment {
            Some(fragment) => format!("{}{}", link, fragment),
            None => link,
        })
    }

    /// Picks the local or external target for an un-wrapped reference
    fn locate(&self, clean: &str) -> String {
        let absolute = if is_absolute_http(clean) {
            canonicalize(clean)
        } else {
            self.base
                .as_ref()
                .and_then(|base| resolve(clean, base))
                .and_then(|resolved| canonicalize(&resolved))
        };

        let Some(absolute) = absolute else {
            return clean.to_string();
        };

        if let Some(path) = self.table.get(&absolute) {
            return self.relative_to_file(&path);
        }

        if !self.scope.contains(&absolute) {
            return clean.to_string();
        }

        if let Some(path) = self.mapper.convert_dispatch_url_to_path(&absolute) {
            return self.relative_to_file(&path);
        }

        if is_absolute_http(clean) {
            Url::parse(clean)
                .map(|url| url.path().to_string())
                .unwrap_or_else(|_| clean.to_string())
        } else {
            clean.to_string()
        }
    }

    /// Converts `/x/y` into a path relative to this file via the output root
    fn root_absolute_to_relative(&self, link: &str) -> Option<String> {
        if !link.starts_with('/') || link.starts_with("//") {
            return None;
        }
        let target = self.mapper.output_root().join(link.trim_start_matches('/'));
        let mut relative = self.relative_to_file(&target);
        if link.ends_with('/') && !relative.ends_with('/') {
            relative.push('/');
        }
        Some(relative)
    }

    /// Path of `target` relative to this file's directory, with `/` separators
    fn relative_to_file(&self, target: &Path) -> String {
        let relative = pathdiff::diff_paths(target, &self.file_dir)
            .unwrap_or_else(|| target.to_path_buf());
        let relative = relative.to_string_lossy().replace('\\', "/");
        if relative.is_empty() {
            "./".to_string()
        } else {
            relative
        }
    }
}

/// Repairs link shapes that surface after un-wrapping
///
/// - `//name.html` or `//segment-without-dot/...` collapse to a relative path
/// - other protocol-relative links gain `https:`
/// - `http(s)://name.html` collapses to `name.html`
///
/// # Examples
///
/// ```
/// use wayback_mirror::rewrite::fix_protocol_and_local_links;
///
/// assert_eq!(fix_protocol_and_local_links("//local-page.html"), "local-page.html");
/// assert_eq!(fix_protocol_and_local_links("//cdn.example.com/a.js"), "https://cdn.example.com/a.js");
/// assert_eq!(fix_protocol_and_local_links("https://about.html#team"), "about.html#team");
/// ```
pub fn fix_protocol_and_local_links(link: &str) -> String {
    if let Some(rest) = link.strip_prefix("//") {
        let first_segment = rest.split(['/', '?', '#']).next().unwrap_or("");
        if PROTOCOL_RELATIVE_PAGE.is_match(link) || !first_segment.contains('.') {
            return rest.to_string();
        }
        return format!("https:{}", link);
    }

    if SCHEMED_LOCAL_PAGE.is_match(link) {
        if let Some((_, rest)) = link.split_once("://") {
            return rest.to_string();
        }
    }

    link.to_string()
}
