use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Shared, append-only mapping from canonical URL to local file
///
/// Discovery registers pages, asset workers register downloaded assets
/// concurrently, and the rewriter only reads. The first path registered for
/// a URL wins.
#[derive(Debug, Default)]
pub struct UrlTable {
    entries: RwLock<HashMap<String, PathBuf>>,
}

impl UrlTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a URL; returns false if the URL already had a path
    pub fn insert(&self, url: impl Into<String>, path: impl Into<PathBuf>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let url = url.into();
        if entries.contains_key(&url) {
            return false;
        }
        entries.insert(url, path.into());
        true
    }

    /// Looks up the local path of a URL
    pub fn get(&self, url: &str) -> Option<PathBuf> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Returns true if the URL has a local path
    pub fn contains(&self, url: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(url)
    }

    /// Returns true if any URL maps to the given path
    pub fn claims_path(&self, path: &Path) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .any(|p| p == path)
    }

    /// Finds a URL registered for the given path
    ///
    /// When several URLs share the path the lexicographically smallest is
    /// returned so the answer is stable between runs.
    pub fn source_for(&self, path: &Path) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, p)| p.as_path() == path)
            .map(|(url, _)| url)
            .min()
            .cloned()
    }

    /// Number of registered URLs
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
