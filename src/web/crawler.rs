//! Breadth-first same-origin site crawler.
//!
//! Discovery is an explicit frontier (visited set + FIFO queue) rather than
//! recursion, so the page budget and cycle avoidance live in one place. A
//! single page's failure is absorbed: the URL stays visited and the crawl
//! moves on.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use url::{Origin, Url};

use super::extractor::extract_links;
use super::renderer::PageRenderer;

/// The crawler's working state for one run.
pub struct CrawlFrontier {
    visited: HashSet<Url>,
    /// Visit order, for a deterministic result set.
    order: Vec<Url>,
    queue: VecDeque<Url>,
    origin: Origin,
    budget: usize,
}

impl CrawlFrontier {
    pub fn new(seed: &Url, budget: usize) -> Self {
        let seed = normalize_url(seed);
        let origin = seed.origin();
        let mut queue = VecDeque::new();
        queue.push_back(seed);
        Self {
            visited: HashSet::new(),
            order: Vec::new(),
            queue,
            origin,
            budget,
        }
    }

    /// Next URL to fetch, already marked visited. None once the queue is
    /// empty or the budget is spent.
    fn next(&mut self) -> Option<Url> {
        if self.visited.len() >= self.budget {
            return None;
        }
        let url = self.queue.pop_front()?;
        self.visited.insert(url.clone());
        self.order.push(url.clone());
        Some(url)
    }

    /// Enqueues a discovered link if it is same-origin and unseen.
    /// Normalization happens here so the queue only ever holds one form.
    fn admit(&mut self, url: &Url) {
        let url = normalize_url(url);
        if url.origin() != self.origin {
            return;
        }
        if self.visited.contains(&url) || self.queue.contains(&url) {
            return;
        }
        self.queue.push_back(url);
    }

    fn into_visited(self) -> Vec<Url> {
        self.order
    }
}

/// One normalization policy per run: fragment stripped, query stripped,
/// trailing slash trimmed except on the root path.
pub fn normalize_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url.set_query(None);
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }
    url
}

pub struct SiteCrawler {
    renderer: Arc<dyn PageRenderer>,
}

impl SiteCrawler {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    /// Breadth-first crawl from `seed`, visiting at most `budget` pages.
    /// Returns the visited URLs in visit order; never leaves the seed's
    /// origin.
    pub async fn crawl(&self, seed: &Url, budget: usize) -> Vec<Url> {
        let mut frontier = CrawlFrontier::new(seed, budget);

        while let Some(url) = frontier.next() {
            match self.renderer.render(&url).await {
                Ok(page) => {
                    // resolve against the final URL: the page may have redirected
                    for link in extract_links(&page.html, &page.final_url) {
                        frontier.admit(&link);
                    }
                }
                Err(err) => {
                    tracing::warn!(%url, error = %err, "page fetch failed, continuing crawl");
                }
            }
        }

        frontier.into_visited()
    }
}
