//! Crawler module for archive fetching and page discovery
//!
//! This module contains the core archiving logic, including:
//! - Enumerating captured pages from the archive index
//! - Fetching raw captures through the replay endpoint
//! - HTML parsing and reference extraction
//! - The page state machine and work queue
//! - Overall archive orchestration

mod discoverer;
mod fetcher;
mod frontier;
mod index;
mod orchestrator;
mod parser;

pub use discoverer::{Discoverer, DiscoveryOutcome, PageSource};
pub use fetcher::{
    build_http_client, fetch_url, replay_url, Content, ContentFetcher, ContentKind, FetchResult,
};
pub use frontier::{Frontier, PageCandidate};
pub use index::{enumerate_pages, parse_index_rows, select_closest, IndexQuery};
pub use orchestrator::{run_archive, AssetJob, Orchestrator};
pub use parser::{extract_references, ExtractedReferences};
