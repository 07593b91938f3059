//! Markup helpers shared by discovery and rewriting
//!
//! The reference table, `srcset` splitting and CSS `url(...)` matching live
//! here so that link extraction and link rewriting agree on what counts as a
//! reference.

pub mod artifacts;

pub use artifacts::{is_injected, remove_injected_elements, strip_artifacts};

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Reference-bearing (tag, attribute) pairs
pub const REFERENCE_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("script", "src"),
    ("img", "src"),
    ("input", "src"),
    ("source", "src"),
    ("track", "src"),
    ("video", "src"),
    ("video", "poster"),
    ("audio", "src"),
    ("iframe", "src"),
    ("frame", "src"),
    ("embed", "src"),
    ("object", "data"),
    ("form", "action"),
    ("body", "background"),
    ("table", "background"),
    ("td", "background"),
];

/// CSS `url(...)` reference, quoted or not; group 1 is the URL
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^)"']*)["']?\s*\)"#).expect("CSS url pattern is valid")
});

/// Reference attributes carried by the given tag
pub fn reference_attributes(tag: &str) -> impl Iterator<Item = &'static str> + '_ {
    REFERENCE_ATTRIBUTES
        .iter()
        .filter(move |(t, _)| t.eq_ignore_ascii_case(tag))
        .map(|(_, attr)| *attr)
}

/// Iterates over the non-empty URLs referenced by `url(...)` in CSS text
pub fn css_urls(css: &str) -> impl Iterator<Item = &str> {
    CSS_URL
        .captures_iter(css)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
}

/// Replaces every `url(...)` reference the resolver returns a value for
///
/// Replacements are written as `url("<new>")`; references the resolver
/// declines are left byte-for-byte unchanged.
pub fn replace_css_urls<'a, F>(css: &'a str, mut resolver: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> Option<String>,
{
    CSS_URL.replace_all(css, |caps: &Captures<'_>| {
        let url = caps[1].trim();
        if url.is_empty() {
            return caps[0].to_string();
        }
        match resolver(url) {
            Some(new_url) => format!("url(\"{}\")", new_url),
            None => caps[0].to_string(),
        }
    })
}

/// Returns the URL token of every `srcset` candidate
pub fn srcset_urls(srcset: &str) -> Vec<&str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .collect()
}

/// Rewrites the URL token of every `srcset` candidate, keeping descriptors
///
/// # Examples
///
/// ```
/// use wayback_mirror::html::rewrite_srcset;
///
/// let out = rewrite_srcset("a.png 1x, /b.png 2x", |url| Some(url.trim_start_matches('/').to_string()));
/// assert_eq!(out, "a.png 1x, b.png 2x");
/// ```
pub fn rewrite_srcset<F>(srcset: &str, mut resolver: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut tokens = candidate.split_whitespace();
            let url = tokens.next()?;
            let url = resolver(url).unwrap_or_else(|| url.to_string());
            Some(std::iter::once(url.as_str()).chain(tokens).collect::<Vec<_>>().join(" "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
