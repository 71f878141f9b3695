// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{collect_seed_urls, load_urls_from_file, parse_url_line, resolve_config_dir};

// Re-export crawl functionality from sitemapper-core
pub use sitemapper_core::crawl::{CrawlOptions, CrawlReport, execute_crawl};
