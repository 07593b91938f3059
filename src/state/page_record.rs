use std::path::PathBuf;

/// A page fetched during discovery, ready to be rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Canonical URL of the page
    pub url: String,

    /// Archive timestamp the page was requested at
    pub timestamp: String,

    /// Markup after archive artifacts were stripped
    pub html: String,

    /// File the rewritten page is written to
    pub local_path: PathBuf,
}
