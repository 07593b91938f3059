//! Archive orchestration - the end-to-end pipeline
//!
//! This module runs one archive of a site snapshot:
//! - Enumerating captured pages from the archive index
//! - Guaranteeing the entry page is crawled first
//! - Page discovery
//! - Concurrent asset downloads with a bounded worker count
//! - Page, stylesheet and script rewriting
//! - The root redirect file and run summary
//!
//! Per-resource failures are logged and skipped; only setup failures
//! abort the run.

use crate::config::Config;
use crate::crawler::discoverer::{Discoverer, DiscoveryOutcome};
use crate::crawler::fetcher::{ContentFetcher, ContentKind};
use crate::crawler::frontier::PageCandidate;
use crate::crawler::index::enumerate_pages;
use crate::mapper::PathMapper;
use crate::output::{write_file, write_redirect, ArchiveSummary, RedirectOutcome};
use crate::rewrite::{Rewriter, StaticRewriteStats};
use crate::state::{PageRecord, PageState, UrlTable};
use crate::url::{canonicalize, has_asset_extension, is_archive_host_url, SiteScope};
use crate::MirrorError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// An asset selected for download and the file it is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetJob {
    /// Canonical URL of the asset
    pub url: String,
    /// Local file of the asset
    pub local_path: PathBuf,
}

/// Runs the archive pipeline for one configuration
pub struct Orchestrator {
    config: Config,
    scope: SiteScope,
    fetcher: ContentFetcher,
    mapper: Arc<PathMapper>,
    table: Arc<UrlTable>,
    output_root: PathBuf,
}

impl Orchestrator {
    /// Creates an orchestrator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(MirrorError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, MirrorError> {
        let fetcher = ContentFetcher::from_config(&config)?;
        let output_root = PathBuf::from(&config.output.directory);

        Ok(Self {
            scope: SiteScope::new(&config.site.domain),
            mapper: Arc::new(PathMapper::new(&output_root)),
            table: Arc::new(UrlTable::new()),
            fetcher,
            output_root,
            config,
        })
    }

    /// Root directory of the generated site
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Runs the whole pipeline
    ///
    /// 1. Creates the output root
    /// 2. Enumerates candidate pages from the archive index
    /// 3. Discovers pages and asset references
    /// 4. Downloads assets concurrently
    /// 5. Rewrites and writes pages
    /// 6. Rewrites stylesheets and cleans scripts on disk
    /// 7. Writes the root redirect file
    pub async fn run(&self) -> Result<ArchiveSummary, MirrorError> {
        let started = Instant::now();
        tokio::fs::create_dir_all(&self.output_root).await?;

        tracing::info!(
            "Archiving {} at {} into {}",
            self.scope.domain(),
            self.config.site.snapshot,
            self.output_root.display()
        );

        let candidates = self.seed_candidates().await;
        tracing::info!("Found {} candidate pages", candidates.len());

        let mut discoverer = Discoverer::new(
            &self.fetcher,
            &self.mapper,
            &self.table,
            self.scope.clone(),
            self.config.site.snapshot.clone(),
            self.config.crawler.max_pages,
        );
        discoverer.seed(candidates);
        let outcome = discoverer.run().await?;

        let jobs = self.select_assets(&outcome);
        tracing::info!("Downloading {} assets", jobs.len());
        let assets_requested = jobs.len();
        let assets_saved = self.download_assets(jobs).await;

        let pages_written = self.write_pages(&outcome.pages).await;
        tracing::info!("Wrote {} of {} pages", pages_written, outcome.pages.len());

        let static_stats = self.rewrite_static_files().await;

        let entry_path = match canonicalize(&self.config.site.entry_url)
            .and_then(|url| self.table.get(&url))
        {
            Some(path) => tokio::fs::try_exists(&path)
                .await
                .unwrap_or(false)
                .then_some(path),
            None => None,
        };
        let redirect = match write_redirect(
            &self.output_root,
            entry_path.as_deref(),
            self.config.site.display_title(),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Could not write root index.html: {}", e);
                RedirectOutcome::NoTarget
            }
        };

        let summary = ArchiveSummary {
            output_root: self.output_root.clone(),
            pages_stored: outcome.count(PageState::Stored),
            pages_aliased: outcome.count(PageState::Aliased),
            pages_failed: outcome.count(PageState::FetchFailed),
            pages_off_site: outcome.count(PageState::OffSite),
            capped: outcome.capped,
            assets_requested,
            assets_saved,
            assets_failed: assets_requested - assets_saved,
            dispatch_mappings: self.mapper.dispatch_mappings(),
            css_rewritten: static_stats.css_rewritten,
            scripts_cleaned: static_stats.scripts_cleaned,
            entry_path: entry_path
                .as_deref()
                .and_then(|path| pathdiff::diff_paths(path, &self.output_root))
                .map(|path| path.to_string_lossy().replace('\\', "/")),
            redirect_target: match redirect {
                RedirectOutcome::Written { target } => Some(target),
                _ => None,
            },
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Archive complete: {} pages, {} assets in {:?}",
            summary.pages_stored,
            summary.assets_saved,
            summary.elapsed
        );

        Ok(summary)
    }

    /// Index candidates with the entry page moved or inserted at the front
    async fn seed_candidates(&self) -> Vec<PageCandidate> {
        let snapshot = &self.config.site.snapshot;
        let mut candidates = enumerate_pages(
            self.fetcher.client(),
            &self.config.archive.index_endpoint,
            &self.scope,
            snapshot,
        )
        .await;

        let entry = canonicalize(&self.config.site.entry_url)
            .unwrap_or_else(|| self.config.site.entry_url.clone());
        let position = candidates
            .iter()
            .position(|c| canonicalize(&c.url).as_deref() == Some(entry.as_str()));

        let entry_candidate = match position {
            Some(idx) => candidates.remove(idx),
            None => {
                tracing::info!("Entry page {} not in the index, adding it", entry);
                PageCandidate {
                    url: entry,
                    timestamp: snapshot.clone(),
                }
            }
        };
        candidates.insert(0, entry_candidate);
        candidates
    }

    /// Chooses which extracted references to download
    ///
    /// # Filter
    ///
    /// - not already in the URL table (stored pages and aliases)
    /// - never queued as a page
    /// - not served by the archive host itself
    /// - on-site, or off-site with an asset extension when external assets
    ///   are mirrored
    ///
    /// References mapping to an already claimed local path are dropped;
    /// on-site references are considered first so they win such conflicts.
    pub fn select_assets(&self, outcome: &DiscoveryOutcome) -> Vec<AssetJob> {
        let mut on_site = Vec::new();
        let mut external = Vec::new();

        for url in &outcome.assets {
            if self.table.contains(url)
                || outcome.page_urls.contains(url)
                || is_archive_host_url(url)
            {
                continue;
            }
            if self.scope.contains(url) {
                on_site.push(url);
            } else if self.config.crawler.mirror_external_assets && has_asset_extension(url) {
                external.push(url);
            }
        }

        let mut claimed = HashSet::new();
        let mut jobs = Vec::new();
        for url in on_site.into_iter().chain(external) {
            let local_path = self.mapper.url_to_local_path(url);
            if self.table.claims_path(&local_path) || !claimed.insert(local_path.clone()) {
                tracing::debug!("Skipping {}: {} already taken", url, local_path.display());
                continue;
            }
            jobs.push(AssetJob {
                url: url.clone(),
                local_path,
            });
        }

        jobs
    }

    /// Fetches and writes assets with at most `asset-workers` in flight
    ///
    /// Returns the number of assets saved.
    async fn download_assets(&self, jobs: Vec<AssetJob>) -> usize {
        let fetcher = &self.fetcher;
        let table = &self.table;
        let snapshot = self.config.site.snapshot.as_str();
        let workers = self.config.crawler.asset_workers.max(1);

        let results: Vec<bool> = stream::iter(jobs)
            .map(|job| async move {
                // Raw bytes, so stylesheets and scripts keep their own encoding
                let Some(content) = fetcher.fetch(snapshot, &job.url, ContentKind::Binary).await
                else {
                    return false;
                };

                match write_file(&job.local_path, content.into_bytes()).await {
                    Ok(()) => {
                        table.insert(job.url.as_str(), job.local_path.clone());
                        tracing::debug!("Saved {}", job.local_path.display());
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Could not write {}: {}", job.local_path.display(), e);
                        false
                    }
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        results.into_iter().filter(|saved| *saved).count()
    }

    /// Runs the stylesheet and script passes on the blocking thread pool
    async fn rewrite_static_files(&self) -> StaticRewriteStats {
        let table = Arc::clone(&self.table);
        let mapper = Arc::clone(&self.mapper);
        let scope = self.scope.clone();
        let root = self.output_root.clone();

        let pass = tokio::task::spawn_blocking(move || {
            Rewriter::new(&table, &mapper, &scope).rewrite_static_files(&root)
        });

        match pass.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Stylesheet and script pass failed: {}", e);
                StaticRewriteStats::default()
            }
        }
    }

    /// Rewrites and writes every stored page
    ///
    /// Returns the number of pages written.
    async fn write_pages(&self, pages: &[PageRecord]) -> usize {
        let rewriter = Rewriter::new(&self.table, &self.mapper, &self.scope);
        let mut written = 0;

        for record in pages {
            let html = rewriter.rewrite_page(record);
            match write_file(&record.local_path, html).await {
                Ok(()) => {
                    written += 1;
                    tracing::debug!("Wrote {}", record.local_path.display());
                }
                Err(e) => tracing::warn!("Could not write {}: {}", record.local_path.display(), e),
            }
        }

        written
    }
}

/// Runs a complete archive operation
///
/// This is the main entry point for archiving a snapshot.
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(ArchiveSummary)` - The run completed, possibly with skipped resources
/// * `Err(MirrorError)` - Setup failed (HTTP client, output directory)
pub async fn run_archive(config: Config) -> Result<ArchiveSummary, MirrorError> {
    Orchestrator::new(config)?.run().await
}
