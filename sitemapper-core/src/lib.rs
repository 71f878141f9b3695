pub mod config;
pub mod crawl;
pub mod data;
pub mod error;
pub mod report;

pub use config::Config;
pub use crawl::{CrawlOptions, CrawlProgressCallback, CrawlReport, execute_crawl, execute_crawl_with};
pub use data::{Database, SitemapSource, StoredResult};
pub use error::{CoreError, Result};
pub use report::{ReportFormat, generate_crawl_summary, render_report, write_report};

/// Printed to stderr; stdout is reserved for reports
pub fn print_banner() {
    eprintln!(
        r#"
  ___ _ _
 / __(_) |_ ___ _ __  __ _ _ __ _ __  ___ _ _
 \__ \ |  _/ -_) '  \/ _` | '_ \ '_ \/ -_) '_|
 |___/_|\__\___|_|_|_\__,_| .__/ .__/\___|_|
                          |_|  |_|   v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
