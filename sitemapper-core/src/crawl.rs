use crate::error::{CoreError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use sitemapper_scanner::crawler::DEFAULT_MAX_DEPTH;
use sitemapper_scanner::fetcher::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use sitemapper_scanner::{CrawlResult, Fetch, HttpFetcher, SitemapCrawler};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Deepest nesting a caller may ask for
pub const MAX_DEPTH_LIMIT: usize = 20;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub max_depth: usize,
    pub limit: Option<NonZeroUsize>,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub show_progress: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            limit: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            show_progress: false,
        }
    }
}

impl CrawlOptions {
    pub fn validate(&self) -> Result<()> {
        if self.urls.iter().all(|u| u.trim().is_empty()) {
            return Err(CoreError::InvalidOptions(
                "at least one sitemap URL is required".to_string(),
            ));
        }
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.max_depth) {
            return Err(CoreError::InvalidOptions(format!(
                "max depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }
        Ok(())
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A finished crawl, ready to be shown, stored or exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub urls: Vec<String>,
    pub total: usize,
    pub errors: Vec<String>,
    pub elapsed_ms: u64,
    pub sources: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl CrawlReport {
    pub fn new(result: CrawlResult, sources: usize, elapsed_ms: u64) -> Self {
        Self {
            total: result.urls.len(),
            urls: result.urls,
            errors: result.errors,
            elapsed_ms,
            sources,
            token: None,
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn to_result(&self) -> CrawlResult {
        CrawlResult::new(self.urls.clone(), self.errors.clone())
    }
}

impl From<crate::data::StoredResult> for CrawlReport {
    fn from(stored: crate::data::StoredResult) -> Self {
        Self {
            total: stored.urls.len(),
            urls: stored.urls,
            errors: stored.errors,
            elapsed_ms: stored.elapsed_ms,
            sources: stored.sources,
            token: Some(stored.token),
        }
    }
}

/// Execute a crawl over HTTP with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlReport> {
    let user_agent = options
        .user_agent
        .as_deref()
        .unwrap_or(DEFAULT_USER_AGENT)
        .to_string();
    let fetcher = HttpFetcher::with_options(options.timeout_secs, &user_agent)?;

    execute_crawl_with(fetcher, options, progress_callback).await
}

/// Execute a crawl using any fetch implementation
pub async fn execute_crawl_with<F: Fetch>(
    fetcher: F,
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlReport> {
    options.validate()?;

    let CrawlOptions {
        urls,
        max_depth,
        limit,
        show_progress,
        ..
    } = options;

    // Single spinner for overall crawl progress (only if enabled)
    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let fetched_count = Arc::new(AtomicUsize::new(0));
    let count_clone = fetched_count.clone();
    let pb_clone = progress_bar.clone();
    let callback_clone = progress_callback.clone();
    let internal_progress_callback: sitemapper_scanner::ProgressCallback =
        Arc::new(move |depth: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("[{}] depth {}: {}", count, depth, url));
            }
            if let Some(ref callback) = callback_clone {
                callback(format!("Fetching sitemap (depth {}): {}", depth, url));
            }
        });

    let crawler = SitemapCrawler::new(fetcher)
        .with_max_depth(max_depth)
        .with_url_limit(limit)
        .with_progress_callback(internal_progress_callback);

    let start = Instant::now();
    let result = crawler.crawl(urls.as_slice()).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    info!(
        "Crawled {} sitemap(s) in {} ms: {} URLs, {} errors",
        fetched_count.load(Ordering::Relaxed),
        elapsed_ms,
        result.urls.len(),
        result.errors.len()
    );

    Ok(CrawlReport::new(result, urls.len(), elapsed_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(urls: &[&str]) -> CrawlOptions {
        CrawlOptions {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            ..CrawlOptions::default()
        }
    }

    #[test]
    fn test_default_options() {
        let opts = CrawlOptions::default();
        assert_eq!(opts.max_depth, 5);
        assert_eq!(opts.timeout_secs, 20);
        assert!(opts.limit.is_none());
    }

    #[test]
    fn test_validate_requires_urls() {
        assert!(matches!(
            options(&[]).validate(),
            Err(CoreError::InvalidOptions(_))
        ));
        assert!(options(&["  "]).validate().is_err());
        assert!(options(&["example.com/sitemap.xml"]).validate().is_ok());
    }

    #[test]
    fn test_validate_depth_range() {
        let mut opts = options(&["https://example.com/sitemap.xml"]);
        opts.max_depth = 0;
        assert!(opts.validate().is_err());
        opts.max_depth = 21;
        assert!(opts.validate().is_err());
        opts.max_depth = 1;
        assert!(opts.validate().is_ok());
        opts.max_depth = 20;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_report_counts_urls() {
        let result = CrawlResult::new(
            vec!["https://a.example/1".to_string(), "https://a.example/2".to_string()],
            vec!["Empty response from https://a.example/x.xml".to_string()],
        );
        let report = CrawlReport::new(result.clone(), 3, 42);

        assert_eq!(report.total, 2);
        assert_eq!(report.sources, 3);
        assert_eq!(report.elapsed_ms, 42);
        assert_eq!(report.token, None);
        assert_eq!(report.to_result(), result);
    }
}
