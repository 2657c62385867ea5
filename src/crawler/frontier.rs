//! Breadth-first crawl frontier
//!
//! URLs are interned once into an arena; the hash index gives O(1)
//! membership for "already seen" checks, and the FIFO queue holds arena ids.
//! A URL is admitted at most once per crawl, so it can never be queued twice
//! or fetched again after a failure.

use std::collections::{HashMap, HashSet, VecDeque};

/// Transient state of a single discovery run
#[derive(Debug)]
pub struct CrawlFrontier {
    urls: Vec<String>,
    index: HashMap<String, usize>,
    queue: VecDeque<usize>,
    visited: HashSet<usize>,
    discovered: Vec<usize>,
    max_pages: usize,
}

impl CrawlFrontier {
    /// Create a frontier seeded with `seed`
    pub fn new(seed: impl Into<String>, max_pages: usize) -> Self {
        let mut frontier = Self {
            urls: Vec::new(),
            index: HashMap::new(),
            queue: VecDeque::new(),
            visited: HashSet::new(),
            discovered: Vec::new(),
            max_pages,
        };
        frontier.admit(seed);
        frontier
    }

    /// Enqueue `url` if it has never been seen, returning whether it was added
    pub fn admit(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.index.contains_key(&url) {
            return false;
        }

        let id = self.urls.len();
        self.index.insert(url.clone(), id);
        self.urls.push(url);
        self.queue.push_back(id);
        true
    }

    /// Whether `url` has been admitted at any point of the crawl
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Pop the next URL to fetch, marking it visited
    ///
    /// Returns `None` once the frontier is exhausted.
    pub fn next_url(&mut self) -> Option<(usize, &str)> {
        if self.discovered.len() >= self.max_pages {
            return None;
        }

        while let Some(id) = self.queue.pop_front() {
            if self.visited.insert(id) {
                return Some((id, self.urls[id].as_str()));
            }
        }
        None
    }

    /// Record a successfully fetched URL
    pub fn mark_discovered(&mut self, id: usize) {
        if self.discovered.len() < self.max_pages && id < self.urls.len() {
            self.discovered.push(id);
        }
    }

    /// Whether the crawl should stop
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() || self.discovered.len() >= self.max_pages
    }

    /// Number of URLs fetched successfully so far
    pub fn discovered_len(&self) -> usize {
        self.discovered.len()
    }

    /// Number of URLs waiting to be fetched
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Consume the frontier, returning discovered URLs in BFS order
    pub fn into_discovered(self) -> Vec<String> {
        let mut urls: Vec<Option<String>> = self.urls.into_iter().map(Some).collect();
        self.discovered
            .into_iter()
            .filter_map(|id| urls[id].take())
            .collect()
    }
}
