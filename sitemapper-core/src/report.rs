// Rendering of crawl reports

use crate::crawl::CrawlReport;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

/// One URL per line, newline-terminated when there is at least one URL
pub fn render_text(urls: &[String]) -> String {
    let mut body = urls.join("\n");
    if !urls.is_empty() {
        body.push('\n');
    }
    body
}

pub fn render_csv(urls: &[String]) -> String {
    let mut body = String::from("url\n");
    for url in urls {
        body.push('"');
        body.push_str(&url.replace('"', "\"\""));
        body.push_str("\"\n");
    }
    body
}

pub fn render_report(report: &CrawlReport, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => render_text(&report.urls),
        ReportFormat::Json => serde_json::to_string_pretty(report)?,
        ReportFormat::Csv => render_csv(&report.urls),
    })
}

pub fn write_report(path: &Path, format: ReportFormat, report: &CrawlReport) -> Result<()> {
    let content = render_report(report, format)?;
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Generate a human-readable crawl summary
pub fn generate_crawl_summary(report: &CrawlReport) -> String {
    let mut summary = String::new();
    summary.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    summary.push_str("# Summary:\n");
    summary.push_str(&format!("  Sources crawled: {}\n", report.sources));
    summary.push_str(&format!("  URLs found: {}\n", report.total));
    summary.push_str(&format!("  Errors: {}\n", report.errors.len()));
    summary.push_str(&format!("  Elapsed: {} ms\n", report.elapsed_ms));
    if let Some(ref token) = report.token {
        summary.push_str(&format!("  Result token: {}\n", token));
    }

    if !report.errors.is_empty() {
        summary.push_str("\n# Errors:\n");
        for error in &report.errors {
            summary.push_str(&format!("  {}\n", error));
        }
    }

    summary.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    summary
}
