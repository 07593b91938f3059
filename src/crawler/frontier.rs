//! Breadth-first work queue for page discovery
//!
//! The frontier owns the per-page state machine, the FIFO queue and the page
//! cap. It performs no I/O, so termination and cap enforcement can be tested
//! on their own.

use crate::state::PageState;
use crate::MirrorError;
use std::collections::{HashMap, VecDeque};

/// A page waiting to be fetched at a given archive timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCandidate {
    /// Canonical URL of the page
    pub url: String,
    /// Archive timestamp to request the page at
    pub timestamp: String,
}

/// FIFO queue of page candidates with per-URL state tracking
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<PageCandidate>,
    states: HashMap<String, PageState>,
    stored: usize,
    max_pages: usize,
}

impl Frontier {
    /// Creates an empty frontier that stops after `max_pages` stored pages
    pub fn new(max_pages: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            states: HashMap::new(),
            stored: 0,
            max_pages,
        }
    }

    /// Enqueues a page unless its URL is already known
    ///
    /// Returns true if the page was added.
    pub fn push(&mut self, candidate: PageCandidate) -> bool {
        if self.is_known(&candidate.url) {
            return false;
        }
        self.states.insert(candidate.url.clone(), PageState::Queued);
        self.queue.push_back(candidate);
        true
    }

    /// Pops the next page, or `None` once the queue is empty or the cap is hit
    pub fn next(&mut self) -> Option<PageCandidate> {
        if self.is_exhausted() {
            return None;
        }
        self.queue.pop_front()
    }

    /// Moves a page to a new state, validating the transition
    pub fn advance(&mut self, url: &str, to: PageState) -> Result<(), MirrorError> {
        let from = self.state(url).unwrap_or(PageState::Queued);
        if !from.can_transition_to(to) {
            return Err(MirrorError::InvalidTransition {
                url: url.to_string(),
                from,
                to,
            });
        }

        self.states.insert(url.to_string(), to);
        if to == PageState::Stored {
            self.stored += 1;
        }
        Ok(())
    }

    /// Current state of a page, if it was ever queued
    pub fn state(&self, url: &str) -> Option<PageState> {
        self.states.get(url).copied()
    }

    /// Returns true if the URL was ever queued
    pub fn is_known(&self, url: &str) -> bool {
        self.states.contains_key(url)
    }

    /// Number of stored pages
    pub fn stored(&self) -> usize {
        self.stored
    }

    /// Number of pages still waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns true once the stored-page cap has been reached
    pub fn cap_reached(&self) -> bool {
        self.stored >= self.max_pages
    }

    /// Returns true if no more pages will be handed out
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() || self.cap_reached()
    }

    /// Counts pages by state
    pub fn counts_by_state(&self) -> HashMap<PageState, usize> {
        let mut counts = HashMap::new();
        for state in self.states.values() {
            *counts.entry(*state).or_insert(0) += 1;
        }
        counts
    }

    /// Iterates over every URL the frontier has seen
    pub fn known_urls(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}
