//! Script cleanup
//!
//! Scripts are not parsed; only archive replay URLs embedded in their text
//! are replaced by the original URLs.

use crate::url::unwrap_archive_urls;
use std::borrow::Cow;

/// Un-wraps archive replay URLs in script text
///
/// Returns `Cow::Borrowed` when the script contains no replay URL, so
/// callers can skip writing unchanged files.
pub fn clean_script(script: &str) -> Cow<'_, str> {
    unwrap_archive_urls(script)
}
