//! Crawl frontier: the FIFO queue of pending URLs plus every URL ever seen
//!
//! A URL enters `visited` the moment it is first discovered and is never
//! removed, so a URL can be queued at most once per crawl. The queue is
//! strictly first-in first-out, which makes the traversal breadth-first.

use std::collections::{HashSet, VecDeque};

/// Frontier state owned by the engine for one crawl
#[derive(Debug, Default)]
pub struct Frontier {
    /// Every URL ever discovered
    visited: HashSet<String>,

    /// URLs waiting to be processed, in discovery order
    queue: VecDeque<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier seeded with URLs, dropping duplicates
    pub fn with_seeds<I>(seeds: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut frontier = Self::new();
        frontier.discover_all(seeds);
        frontier
    }

    /// Records a discovered URL
    ///
    /// Returns true if the URL was new and has been queued. A URL seen
    /// before is ignored, whether or not it has been processed yet.
    pub fn discover(&mut self, url: String) -> bool {
        if self.visited.contains(&url) {
            return false;
        }
        self.visited.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Records a batch of discovered URLs in order
    ///
    /// Returns the number of URLs that were new.
    pub fn discover_all<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        urls.into_iter().map(|url| self.discover(url)).filter(|new| *new).count()
    }

    /// Pops the oldest pending URL
    pub fn pop(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Number of URLs waiting to be processed
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs ever discovered
    pub fn discovered(&self) -> usize {
        self.visited.len()
    }

    /// Returns true if no URLs are pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
