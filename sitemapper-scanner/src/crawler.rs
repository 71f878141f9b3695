use crate::classifier::classify;
use crate::error::CrawlFailure;
use crate::fetcher::Fetch;
use crate::result::{CrawlResult, SitemapReference};
use regex::Regex;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_DEPTH: usize = 5;

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("scheme pattern is valid"));

/// Called with `(depth, url)` just before each sitemap is fetched
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Trim a sitemap URL and default it to `https://` when no scheme is given.
///
/// Nothing else is canonicalized: trailing slashes, case and query order
/// all stay significant.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || SCHEME_PREFIX.is_match(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Depth-first sitemap crawler.
///
/// The frontier is a stack, so the most recently discovered sitemap is read
/// next. Every normalized sitemap URL is fetched at most once per call to
/// [`SitemapCrawler::crawl`], which keeps cyclic indexes finite.
pub struct SitemapCrawler<F> {
    fetcher: F,
    max_depth: usize,
    url_limit: Option<NonZeroUsize>,
    progress_callback: Option<ProgressCallback>,
}

impl<F: Fetch> SitemapCrawler<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_depth: DEFAULT_MAX_DEPTH,
            url_limit: None,
            progress_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Stop the whole crawl as soon as this many distinct URLs are collected
    pub fn with_url_limit(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.url_limit = limit;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn crawl<S: AsRef<str>>(&self, seeds: &[S]) -> CrawlResult {
        info!(
            "Starting sitemap crawl of {} seed(s), max depth {}",
            seeds.len(),
            self.max_depth
        );

        let mut frontier: Vec<SitemapReference> = seeds
            .iter()
            .map(|seed| SitemapReference::seed(normalize_url(seed.as_ref())))
            .collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut urls: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        while let Some(SitemapReference { url, depth }) = frontier.pop() {
            let url = normalize_url(&url);
            if !visited.insert(url.clone()) {
                debug!("Skipping already visited sitemap {}", url);
                continue;
            }

            if let Some(ref callback) = self.progress_callback {
                callback(depth, url.clone());
            }

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Failed to fetch sitemap {}: {}", url, e);
                    errors.push(
                        CrawlFailure::Fetch {
                            url,
                            cause: e.to_string(),
                        }
                        .to_string(),
                    );
                    continue;
                }
            };

            if body.trim().is_empty() {
                warn!("Empty response from sitemap {}", url);
                errors.push(CrawlFailure::EmptyResponse { url }.to_string());
                continue;
            }

            let classification = classify(&body);

            for leaf in classification.leaf_urls {
                if seen_urls.insert(leaf.clone()) {
                    urls.push(leaf);
                    if let Some(limit) = self.url_limit
                        && urls.len() >= limit.get()
                    {
                        info!("URL limit of {} reached, stopping crawl", limit);
                        return CrawlResult::new(urls, errors);
                    }
                }
            }

            if depth < self.max_depth {
                for nested in classification.nested_sitemaps {
                    let nested = normalize_url(&nested);
                    if !visited.contains(&nested) {
                        frontier.push(SitemapReference::new(nested, depth + 1));
                    }
                }
            } else if !classification.nested_sitemaps.is_empty() {
                debug!(
                    "Depth limit reached at {}, dropping {} nested sitemap(s)",
                    url,
                    classification.nested_sitemaps.len()
                );
            }
        }

        info!(
            "Sitemap crawl complete. Collected {} URLs from {} sitemaps ({} errors)",
            urls.len(),
            visited.len(),
            errors.len()
        );
        CrawlResult::new(urls, errors)
    }
}
