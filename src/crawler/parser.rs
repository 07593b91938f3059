//! HTML parser for extracting references from archived pages
//!
//! This module parses page markup (after injected archive elements were
//! removed) and extracts:
//! - Asset references from every reference-bearing attribute
//! - URLs in `srcset` candidates
//! - `url(...)` references in `style` attributes and `<style>` blocks
//! - Same-site page links to follow

use crate::html::{css_urls, remove_injected_elements, srcset_urls, REFERENCE_ATTRIBUTES};
use crate::url::{canonicalize, has_asset_extension, resolve, SiteScope};
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// References found in one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedReferences {
    /// Every resolved reference, pages included; filtered before download
    pub assets: BTreeSet<String>,

    /// Same-site anchor targets that are not asset files, in document order
    pub page_links: Vec<String>,
}

/// Parses page markup and extracts asset references and page links
///
/// # Extraction Rules
///
/// **Assets:**
/// - every (tag, attribute) pair of the reference table
/// - each candidate URL of `srcset` on `<img>` and `<source>`
/// - `url(...)` inside `style` attributes and `<style>` blocks
///
/// **Page links:**
/// - `<a href>` targets inside the site scope whose path does not end in
///   an asset extension
///
/// Non-fetchable references (`javascript:`, `mailto:`, anchors, data URIs)
/// are dropped, archive replay URLs are un-wrapped and fragments removed.
/// Malformed markup never fails; tag-soup parsing keeps whatever it can.
///
/// # Arguments
///
/// * `html` - The page markup
/// * `base_url` - The page's canonical URL, used to resolve relative references
/// * `scope` - The mirrored site
///
/// # Example
///
/// ```
/// use url::Url;
/// use wayback_mirror::crawler::extract_references;
/// use wayback_mirror::SiteScope;
///
/// let html = r#"<a href="index.php?action=events">Events</a><img src="/logo.png">"#;
/// let base = Url::parse("http://example.org/").unwrap();
/// let refs = extract_references(html, &base, &SiteScope::new("example.org"));
/// assert_eq!(refs.page_links, vec!["http://example.org/index.php?action=events"]);
/// assert!(refs.assets.contains("http://example.org/logo.png"));
/// ```
pub fn extract_references(html: &str, base_url: &Url, scope: &SiteScope) -> ExtractedReferences {
    let cleaned = match remove_injected_elements(html) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            tracing::debug!("Could not pre-clean {}: {}", base_url, e);
            html.to_string()
        }
    };
    let document = Html::parse_document(&cleaned);

    let mut refs = ExtractedReferences::default();
    let resolve_into = |raw: &str, assets: &mut BTreeSet<String>| {
        if let Some(url) = canonical_reference(raw, base_url) {
            assets.insert(url);
        }
    };

    for (tag, attr) in REFERENCE_ATTRIBUTES {
        let Ok(selector) = Selector::parse(&format!("{}[{}]", tag, attr)) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attr) {
                resolve_into(value, &mut refs.assets);
            }
        }
    }

    if let Ok(selector) = Selector::parse("img[srcset], source[srcset]") {
        for element in document.select(&selector) {
            if let Some(srcset) = element.value().attr("srcset") {
                for url in srcset_urls(srcset) {
                    resolve_into(url, &mut refs.assets);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("[style]") {
        for element in document.select(&selector) {
            if let Some(style) = element.value().attr("style") {
                for url in css_urls(style) {
                    resolve_into(url, &mut refs.assets);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("style") {
        for element in document.select(&selector) {
            let css = element.text().collect::<String>();
            for url in css_urls(&css) {
                resolve_into(url, &mut refs.assets);
            }
        }
    }

    refs.page_links = extract_page_links(&document, base_url, scope);
    refs
}

/// Extracts same-site anchor targets that should be crawled as pages
fn extract_page_links(document: &Html, base_url: &Url, scope: &SiteScope) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = canonical_reference(href, base_url) else {
            continue;
        };
        if !scope.contains(&url) || has_asset_extension(&url) {
            continue;
        }
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

/// Resolves a raw reference to its canonical absolute form
fn canonical_reference(raw: &str, base_url: &Url) -> Option<String> {
    let resolved = resolve(raw, base_url)?;
    canonicalize(&resolved)
}
