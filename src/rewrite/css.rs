//! Stylesheet rewriting

use crate::html::replace_css_urls;
use crate::rewrite::resolver::LinkResolver;
use crate::url::unwrap_archive_urls;
use std::borrow::Cow;

/// Un-wraps archive URLs and rewrites every `url(...)` of a stylesheet
///
/// The resolver must be built for the stylesheet's own path so relative
/// results point from the stylesheet's directory.
pub fn rewrite_css<'a>(css: &'a str, resolver: &LinkResolver<'_>) -> Cow<'a, str> {
    match unwrap_archive_urls(css) {
        Cow::Borrowed(css) => replace_css_urls(css, |url| resolver.resolve(url)),
        Cow::Owned(css) => Cow::Owned(
            replace_css_urls(&css, |url| resolver.resolve(url)).into_owned(),
        ),
    }
}
