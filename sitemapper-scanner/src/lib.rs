pub mod classifier;
pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod result;

pub use classifier::{Classification, DocumentKind, classify};
pub use crawler::{ProgressCallback, SitemapCrawler, normalize_url};
pub use error::{CrawlFailure, ScanError};
pub use fetcher::{Fetch, HttpFetcher};
pub use result::{CrawlResult, SitemapReference};
