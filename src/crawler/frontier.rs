//! Frontier management for a single crawl run
//!
//! This module handles:
//! - The FIFO queue of URLs awaiting a visit (breadth-first order)
//! - The visited set that makes every URL single-flight
//! - Page budget enforcement and crawl-scope filtering
//!
//! A frontier is created per run and owned by the crawl task. It is never
//! shared, so every mutation completes before the next await point.

use crate::url::same_authority;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Decision returned when asking the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Process this URL; it is already marked visited
    Next(Url),
    /// Nothing left to visit before the budget was reached
    Completed,
    /// The page budget is spent
    Exhausted,
}

/// Breadth-first frontier with a visited set and a page budget
#[derive(Debug)]
pub struct Frontier {
    base: Url,
    budget: usize,
    pending: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier seeded with exactly one URL
    ///
    /// A budget below 1 is clamped to 1. The seed's authority becomes the
    /// crawl scope.
    pub fn new(seed: Url, budget: usize) -> Self {
        let budget = budget.max(1);
        let mut frontier = Self {
            base: seed.clone(),
            budget,
            pending: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
        };
        frontier.queued.insert(seed.as_str().to_string());
        frontier.pending.push_back(seed);
        frontier
    }

    /// Returns the URL that defines the crawl scope
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Takes the next URL to process
    ///
    /// URLs already visited are discarded without consuming budget. An
    /// admitted URL is marked visited before it is returned.
    pub fn next(&mut self) -> Admission {
        loop {
            if self.visited.len() >= self.budget {
                return Admission::Exhausted;
            }

            let Some(url) = self.pending.pop_front() else {
                return Admission::Completed;
            };
            self.queued.remove(url.as_str());

            if !self.visited.insert(url.as_str().to_string()) {
                tracing::debug!("Skipping already visited {}", url);
                continue;
            }

            return Admission::Next(url);
        }
    }

    /// Adds discovered links to the back of the queue
    ///
    /// A link is admitted only if it has the base authority and is neither
    /// visited nor already pending. Admission stops once visited plus pending
    /// URLs cover the budget, since nothing beyond that could be processed.
    ///
    /// Returns the number of links admitted.
    pub fn enqueue<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        let mut admitted = 0;

        for link in links {
            if self.visited.len() + self.pending.len() >= self.budget {
                tracing::debug!("Budget of {} covered, not queueing more links", self.budget);
                break;
            }

            if !same_authority(&link, &self.base) {
                tracing::debug!("Out of scope: {}", link);
                continue;
            }

            let key = link.as_str();
            if self.visited.contains(key) || self.queued.contains(key) {
                continue;
            }

            self.queued.insert(key.to_string());
            self.pending.push_back(link);
            admitted += 1;
        }

        admitted
    }
}
