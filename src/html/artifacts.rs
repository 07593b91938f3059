//! Removal of markup injected by the archive's replay machinery

use crate::url::unwrap_archive_urls;
use lol_html::html_content::Element;
use lol_html::{doc_comments, element, HtmlRewriter, Settings};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Toolbar block the archive inserts at the top of replayed pages
static TOOLBAR_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--\s*BEGIN WAYBACK TOOLBAR INSERT\s*-->.*?<!--\s*END WAYBACK TOOLBAR INSERT\s*-->")
        .expect("toolbar pattern is valid")
});

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script pattern is valid")
});

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>").expect("style pattern is valid")
});

static ARCHIVE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\b[^>]*href\s*=\s*["'][^"']*archive\.org[^"']*["'][^>]*>"#)
        .expect("link pattern is valid")
});

/// Markers of the archive's in-page runtime inside inline scripts
const SCRIPT_MARKERS: &[&str] = &["__wm.", "wombat", "wb_wombat", "archive.org"];

/// Markers in a script `src` that identify an archive-served script
const SCRIPT_SRC_MARKERS: &[&str] = &["archive.org", "wombat"];

/// Id prefixes of injected elements
const INJECTED_ID_PREFIXES: &[&str] = &["wm-", "playback", "donato"];

/// Class prefixes of injected elements
const INJECTED_CLASS_PREFIXES: &[&str] = &["wm-", "wb-"];

/// Removes archive artifacts from raw page markup by pattern matching
///
/// # Removed
///
/// - The `BEGIN/END WAYBACK TOOLBAR INSERT` comment block
/// - `<script>` elements loading archive scripts, or inline scripts
///   mentioning the archive runtime
/// - `<link>` elements pointing at the archive host
/// - `<style>` blocks mentioning the archive host
///
/// Replay URLs are replaced by their original URLs before the element
/// patterns run, so wrapped references to site content are kept.
/// Malformed markup is never an error; unmatched fragments are kept.
pub fn strip_artifacts(html: &str) -> String {
    let html = TOOLBAR_BLOCK.replace_all(html, "");
    let html = unwrap_archive_urls(&html);

    let html = SCRIPT_BLOCK.replace_all(&html, |caps: &Captures<'_>| {
        let attributes = caps[1].to_ascii_lowercase();
        let body = caps[2].to_ascii_lowercase();
        let archive_src = attributes.contains("src")
            && SCRIPT_SRC_MARKERS.iter().any(|m| attributes.contains(m));
        let archive_body = SCRIPT_MARKERS.iter().any(|m| body.contains(m));
        if archive_src || archive_body {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    let html = ARCHIVE_LINK.replace_all(&html, "");

    let html = STYLE_BLOCK.replace_all(&html, |caps: &Captures<'_>| {
        if caps[1].to_ascii_lowercase().contains("archive.org") {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    html.into_owned()
}

/// Returns true if an element was injected by the archive
///
/// Matches ids starting with `wm-`, `playback` or `donato`, class tokens
/// starting with `wm-` or `wb-`, archive-served scripts and archive
/// stylesheet links.
pub fn is_injected(el: &Element<'_, '_>) -> bool {
    if let Some(id) = el.get_attribute("id") {
        let id = id.to_ascii_lowercase();
        if INJECTED_ID_PREFIXES.iter().any(|p| id.starts_with(p)) {
            return true;
        }
    }

    if let Some(class) = el.get_attribute("class") {
        let class = class.to_ascii_lowercase();
        if class
            .split_whitespace()
            .any(|token| INJECTED_CLASS_PREFIXES.iter().any(|p| token.starts_with(p)))
        {
            return true;
        }
    }

    match el.tag_name().to_ascii_lowercase().as_str() {
        "script" => el.get_attribute("src").is_some_and(|src| {
            let src = src.to_ascii_lowercase();
            SCRIPT_SRC_MARKERS.iter().any(|m| src.contains(m))
        }),
        "link" => el
            .get_attribute("href")
            .is_some_and(|href| href.to_ascii_lowercase().contains("archive.org")),
        _ => false,
    }
}

/// Removes injected elements and all comments from markup
///
/// Runs the same element criteria as the rewriter so that extraction never
/// sees toolbar links or archive scripts.
pub fn remove_injected_elements(html: &str) -> Result<String, lol_html::errors::RewritingError> {
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("*", |el| {
                if is_injected(el) {
                    el.remove();
                }
                Ok(())
            })],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}
