//! Dynamic-dispatch URL conventions
//!
//! Many small PHP sites route every logical page through one script and an
//! `action` query parameter (`index.php?action=events`). These helpers turn
//! such URLs, and dynamic-script URLs in general, into static file names.

use crate::url::split_fragment;
use sha2::{Digest, Sha256};
use std::borrow::Cow;

/// Extensions of server-side scripts that are rewritten to `.html`
pub const DYNAMIC_EXTENSIONS: &[&str] = &[".php", ".php3", ".php4", ".php5", ".phtml"];

/// Query parameter selecting the logical page of a dispatch script
const ACTION_PARAM: &str = "action";

/// A dispatch script path plus the action it was invoked with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DispatchPattern {
    /// URL path of the script, e.g. `/sub/index.php`
    pub base_path: String,
    /// Decoded action value, e.g. `events`
    pub action: String,
}

impl DispatchPattern {
    /// Recognizes the dispatch convention on a URL path and raw query string
    ///
    /// Returns `None` unless the path ends in a dynamic-script extension and
    /// the query carries a non-empty `action` parameter.
    pub fn from_parts(path: &str, query: &str) -> Option<Self> {
        strip_dynamic_extension(path)?;
        let action = action_param(query)?;
        Some(Self {
            base_path: path.to_string(),
            action,
        })
    }

    /// Site-relative path of the generated page: `<dir>/<sanitized action>.html`
    pub fn local_path(&self) -> String {
        let mut segments = decode_segments(&self.base_path);
        segments.pop();
        segments.push(format!("{}.html", sanitize_action(&self.action)));
        segments.join("/")
    }
}

/// Returns the path without its dynamic-script extension, if it has one
pub fn strip_dynamic_extension(path: &str) -> Option<&str> {
    let lowered = path.to_ascii_lowercase();
    DYNAMIC_EXTENSIONS
        .iter()
        .find(|ext| lowered.ends_with(*ext))
        .map(|ext| &path[..path.len() - ext.len()])
}

/// Returns the first non-empty `action` value of a raw query string
pub fn action_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == ACTION_PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Replaces every character outside `[alnum, _, -]` with `_`
pub fn sanitize_action(action: &str) -> String {
    action
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// First 8 lowercase hex characters of the SHA-256 of a raw query string
pub fn query_hash(query: &str) -> String {
    let digest = Sha256::digest(query.as_bytes());
    hex::encode(&digest[..4])
}

/// Splits a URL path into percent-decoded segments safe to use on disk
///
/// Empty, `.` and `..` segments are dropped and separators produced by
/// decoding are replaced with `_`.
pub fn decode_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .unwrap_or(Cow::Borrowed(segment))
                .replace(['/', '\\'], "_")
        })
        .filter(|segment| segment != "." && segment != ".." && !segment.is_empty())
        .collect()
}

/// Converts a relative dynamic-script link to its static equivalent
///
/// - `index.php?action=events` becomes `events.html` (in the link's directory)
/// - `contact.php` becomes `contact.html`
/// - `page.php?foo=bar` becomes `page_<hash8>.html`
///
/// A trailing `#fragment` is kept. Returns `None` if the link does not point
/// at a dynamic script.
pub fn convert_dynamic_link(link: &str) -> Option<String> {
    let (body, fragment) = split_fragment(link);
    let (path, query) = match body.split_once('?') {
        Some((path, query)) => (path, Some(query).filter(|q| !q.is_empty())),
        None => (body, None),
    };
    let stem = strip_dynamic_extension(path)?;

    let converted = match query {
        None => format!("{}.html", stem),
        Some(query) => match action_param(query) {
            Some(action) => {
                let file = format!("{}.html", sanitize_action(&action));
                match path.rfind('/') {
                    Some(idx) if &path[..idx] != "." => format!("{}/{}", &path[..idx], file),
                    _ => file,
                }
            }
            None => format!("{}_{}.html", stem, query_hash(query)),
        },
    };

    Some(format!("{}{}", converted, fragment.unwrap_or("")))
}
