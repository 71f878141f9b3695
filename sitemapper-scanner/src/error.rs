use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// A per-source failure recorded in the crawl's error log.
///
/// None of these stop a crawl; they are rendered to strings and collected
/// alongside the URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlFailure {
    Fetch { url: String, cause: String },
    EmptyResponse { url: String },
}

impl fmt::Display for CrawlFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlFailure::Fetch { url, cause } => write!(f, "Failed {}: {}", url, cause),
            CrawlFailure::EmptyResponse { url } => write!(f, "Empty response from {}", url),
        }
    }
}
