use serde::{Deserialize, Serialize};

/// A sitemap waiting on the frontier, tagged with how many index hops
/// separate it from its seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapReference {
    pub url: String,
    pub depth: usize,
}

impl SitemapReference {
    pub fn new(url: String, depth: usize) -> Self {
        Self { url, depth }
    }

    pub fn seed(url: String) -> Self {
        Self::new(url, 0)
    }
}

/// Output of one crawl: distinct page URLs in first-seen order, plus one
/// human-readable entry per sitemap that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub urls: Vec<String>,
    pub errors: Vec<String>,
}

impl CrawlResult {
    pub fn new(urls: Vec<String>, errors: Vec<String>) -> Self {
        Self { urls, errors }
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.errors.is_empty()
    }
}
