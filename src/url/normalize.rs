use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

/// Replay URL of the archive host: `(scheme:)//web.archive.org/web/<ts>[<flags>_]/<original>`
///
/// Group 1 is the capture timestamp, group 2 the wrapped original URL.
static ARCHIVE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:https?:)?//web\.archive\.org/web/(\d+)(?:[a-z]*_)?/(https?://[^\s"'<>]+|[^\s"'<>]+)"#)
        .expect("archive URL pattern is valid")
});

/// Reference prefixes that never point at fetchable content
const NON_FETCHABLE_PREFIXES: &[&str] = &["data:", "javascript:", "mailto:", "tel:", "about:", "#"];

/// Un-wraps archive replay URLs and filters out non-fetchable references
///
/// # Rules
///
/// - Empty values and `data:`, `javascript:`, `mailto:`, `tel:`, `about:`
///   or anchor-only (`#...`) references yield `None`
/// - A replay URL yields the wrapped original; an original without a scheme
///   gains `https://`. Nested replay URLs are un-wrapped until none remain,
///   so applying this function twice gives the same result as applying it once
/// - Protocol-relative URLs (`//host/path`) gain `https:`
/// - Everything else, including relative paths and bare domain-looking
///   strings, is returned unchanged
///
/// # Examples
///
/// ```
/// use wayback_mirror::url::classify_and_unwrap;
///
/// assert_eq!(
///     classify_and_unwrap("https://web.archive.org/web/20170509211847/http://example.org/page.html"),
///     Some("http://example.org/page.html".to_string())
/// );
/// assert_eq!(
///     classify_and_unwrap("//cdn.example.com/logo.png"),
///     Some("https://cdn.example.com/logo.png".to_string())
/// );
/// assert_eq!(classify_and_unwrap("mailto:someone@example.org"), None);
/// ```
pub fn classify_and_unwrap(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let lowered = url.to_ascii_lowercase();
    if NON_FETCHABLE_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    let mut current = url.to_string();
    while let Some(original) = unwrap_leading_replay_url(&current) {
        current = original;
    }

    if current.starts_with("//") {
        current = format!("https:{}", current);
    }

    Some(current)
}

/// Returns the wrapped original if `url` starts with a replay URL
fn unwrap_leading_replay_url(url: &str) -> Option<String> {
    let captures = ARCHIVE_URL.captures(url)?;
    if captures.get(0)?.start() != 0 {
        return None;
    }
    Some(original_from_captures(&captures))
}

fn original_from_captures(captures: &Captures<'_>) -> String {
    let original = &captures[2];
    if original.starts_with("http") {
        original.to_string()
    } else {
        format!("https://{}", original)
    }
}

/// Replaces every replay URL embedded in free text with its original URL
///
/// Used on whole documents (markup, stylesheets, scripts) where references
/// are not isolated attribute values.
pub fn unwrap_archive_urls(text: &str) -> Cow<'_, str> {
    ARCHIVE_URL.replace_all(text, |captures: &Captures<'_>| original_from_captures(captures))
}

/// Resolves a reference found in a document against the document's URL
///
/// The reference is first passed through [`classify_and_unwrap`]. Absolute
/// http(s) results are kept, root-relative paths are joined to the base
/// origin, and anything else goes through standard relative resolution
/// (including `..` traversal). Returns `None` for non-fetchable references.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wayback_mirror::url::resolve;
///
/// let base = Url::parse("http://www.example.org/page/sub/").unwrap();
/// assert_eq!(
///     resolve("../images/logo.png", &base),
///     Some("http://www.example.org/page/images/logo.png".to_string())
/// );
/// assert_eq!(
///     resolve("/css/site.css", &base),
///     Some("http://www.example.org/css/site.css".to_string())
/// );
/// ```
pub fn resolve(url: &str, base: &Url) -> Option<String> {
    let clean = classify_and_unwrap(url)?;

    let resolved = if is_absolute_http(&clean) {
        Url::parse(&clean).ok()
    } else if clean.starts_with('/') {
        Url::parse(&format!("{}{}", base.origin().ascii_serialization(), clean)).ok()
    } else {
        base.join(&clean).ok()
    };

    Some(resolved.map(String::from).unwrap_or(clean))
}

/// Normalizes an absolute http(s) URL into the key form used by the URL table
///
/// Archive wrapping is removed, the URL is re-serialized and any fragment is
/// dropped. Relative or non-http references yield `None`.
pub fn canonicalize(url: &str) -> Option<String> {
    let clean = classify_and_unwrap(url)?;
    if !is_absolute_http(&clean) {
        return None;
    }
    let mut parsed = Url::parse(&clean).ok()?;
    parsed.set_fragment(None);
    Some(parsed.into())
}

/// Returns true if the string starts with an http or https scheme
pub fn is_absolute_http(url: &str) -> bool {
    let lowered = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// Splits a reference into its body and optional `#fragment` suffix
pub fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.find('#') {
        Some(idx) => (&url[..idx], Some(&url[idx..])),
        None => (url, None),
    }
}
