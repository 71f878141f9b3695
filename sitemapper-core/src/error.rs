use sitemapper_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Sitemap already exists: {0}")]
    DuplicateSource(String),

    #[error("Invalid sitemap source: {0}")]
    InvalidSource(String),

    #[error("Invalid crawl options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
