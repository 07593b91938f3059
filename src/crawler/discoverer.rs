//! Page graph discovery
//!
//! Walks the site breadth-first from the seeded candidates, driving each
//! page through `Queued → Fetched → ArtifactStripped → LinkExtracted →
//! Stored`. Discovery is strictly sequential: a page's links must be queued
//! before the loop can decide it is finished.

use crate::crawler::frontier::{Frontier, PageCandidate};
use crate::crawler::parser::extract_references;
use crate::html::strip_artifacts;
use crate::mapper::PathMapper;
use crate::state::{PageRecord, PageState, UrlTable};
use crate::url::{canonicalize, SiteScope};
use crate::MirrorError;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use url::Url;

/// Anything that can return the archived markup of a page
///
/// Implemented by the HTTP fetcher; tests use an in-memory map.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the page markup, or `None` if it is unavailable
    async fn fetch_page(&self, timestamp: &str, url: &str) -> Option<String>;
}

/// Everything discovery learned about the site
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    /// Stored pages in discovery order
    pub pages: Vec<PageRecord>,

    /// Union of all references extracted from stored pages
    pub assets: BTreeSet<String>,

    /// Every URL that was queued as a page, whatever its final state
    pub page_urls: HashSet<String>,

    /// Number of pages per final state
    pub counts: HashMap<PageState, usize>,

    /// True if the page cap stopped discovery with work still queued
    pub capped: bool,
}

impl DiscoveryOutcome {
    /// Number of pages that ended in the given state
    pub fn count(&self, state: PageState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }
}

/// Drives the page state machine over a work queue
pub struct Discoverer<'a, S: PageSource> {
    source: &'a S,
    mapper: &'a PathMapper,
    table: &'a UrlTable,
    scope: SiteScope,
    snapshot: String,
    frontier: Frontier,
}

impl<'a, S: PageSource> Discoverer<'a, S> {
    /// Creates a discoverer
    ///
    /// # Arguments
    ///
    /// * `source` - Where page markup comes from
    /// * `mapper` - Path mapper shared with the rest of the run
    /// * `table` - Global URL table stored pages are registered in
    /// * `scope` - The mirrored site
    /// * `snapshot` - Timestamp newly discovered links are fetched at
    /// * `max_pages` - Hard cap on stored pages
    pub fn new(
        source: &'a S,
        mapper: &'a PathMapper,
        table: &'a UrlTable,
        scope: SiteScope,
        snapshot: impl Into<String>,
        max_pages: usize,
    ) -> Self {
        Self {
            source,
            mapper,
            table,
            scope,
            snapshot: snapshot.into(),
            frontier: Frontier::new(max_pages),
        }
    }

    /// Queues candidates in order, skipping non-http and duplicate URLs
    ///
    /// Returns the number of candidates added.
    pub fn seed<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = PageCandidate>,
    {
        let mut added = 0;
        for candidate in candidates {
            let Some(url) = canonicalize(&candidate.url) else {
                tracing::warn!("Ignoring unusable candidate URL: {}", candidate.url);
                continue;
            };
            if self.frontier.push(PageCandidate {
                url,
                timestamp: candidate.timestamp,
            }) {
                added += 1;
            }
        }
        added
    }

    /// Runs discovery until the queue is empty or the page cap is reached
    pub async fn run(mut self) -> Result<DiscoveryOutcome, MirrorError> {
        let mut outcome = DiscoveryOutcome::default();
        let mut processed = 0usize;

        tracing::info!(
            "Starting discovery with {} queued pages",
            self.frontier.pending()
        );

        while let Some(candidate) = self.frontier.next() {
            if let Some((record, assets)) = self.process(&candidate).await? {
                outcome.assets.extend(assets);
                outcome.pages.push(record);
            }

            processed += 1;
            if processed % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages processed, {} stored, {} queued",
                    processed,
                    self.frontier.stored(),
                    self.frontier.pending()
                );
            }
        }

        outcome.capped = self.frontier.cap_reached() && self.frontier.pending() > 0;
        if outcome.capped {
            tracing::warn!(
                "Page cap reached, {} queued pages were not fetched",
                self.frontier.pending()
            );
        }

        outcome.page_urls = self.frontier.known_urls().map(str::to_string).collect();
        outcome.counts = self.frontier.counts_by_state();

        tracing::info!(
            "Discovery finished: {} pages stored, {} asset references",
            outcome.pages.len(),
            outcome.assets.len()
        );

        Ok(outcome)
    }

    /// Moves one page through the state machine
    ///
    /// Returns the stored record and its references, or `None` if the page
    /// ended in a skip or failure state.
    async fn process(
        &mut self,
        candidate: &PageCandidate,
    ) -> Result<Option<(PageRecord, BTreeSet<String>)>, MirrorError> {
        let url = candidate.url.as_str();

        let base = match Url::parse(url) {
            Ok(base) if self.scope.contains_url(&base) => base,
            _ => {
                tracing::debug!("Skipping off-site page {}", url);
                self.frontier.advance(url, PageState::OffSite)?;
                return Ok(None);
            }
        };

        let local_path = self.mapper.url_to_local_path(url);
        if self.table.claims_path(&local_path) {
            tracing::debug!("{} is an alias of {}", url, local_path.display());
            self.table.insert(url, local_path);
            self.frontier.advance(url, PageState::Aliased)?;
            return Ok(None);
        }

        let Some(raw) = self.source.fetch_page(&candidate.timestamp, url).await else {
            self.frontier.advance(url, PageState::FetchFailed)?;
            return Ok(None);
        };
        self.frontier.advance(url, PageState::Fetched)?;

        let html = strip_artifacts(&raw);
        self.frontier.advance(url, PageState::ArtifactStripped)?;

        let refs = extract_references(&html, &base, &self.scope);
        self.frontier.advance(url, PageState::LinkExtracted)?;

        for link in refs.page_links {
            if self.frontier.push(PageCandidate {
                url: link.clone(),
                timestamp: self.snapshot.clone(),
            }) {
                tracing::debug!("Queued {}", link);
            }
        }

        self.table.insert(url, local_path.clone());
        self.frontier.advance(url, PageState::Stored)?;
        tracing::debug!("Stored {} as {}", url, local_path.display());

        Ok(Some((
            PageRecord {
                url: url.to_string(),
                timestamp: candidate.timestamp.clone(),
                html,
                local_path,
            },
            refs.assets,
        )))
    }
}
