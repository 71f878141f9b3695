use clap::ArgMatches;
use colored::Colorize;
use sitemapper_core::config::{CONFIG_FILE_NAME, Config, database_path};
use sitemapper_core::crawl::{CrawlOptions, CrawlReport, execute_crawl};
use sitemapper_core::data::{Database, SitemapSource};
use sitemapper_core::report::{ReportFormat, generate_crawl_summary, render_report, write_report};
use sitemapper_scanner::normalize_url;
use std::fs;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/sitemapper/";

/// Outcome of a command handler; the message is shown to the user as-is
pub type HandlerResult = Result<(), String>;

// Helper functions for crawl handler

/// Expand `~` in the configured directory
pub fn resolve_config_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Load and parse URLs from a file, one per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a sitemap URL, adding https:// if it has no scheme
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.chars().any(char::is_whitespace) {
        eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
        return None;
    }

    let url = normalize_url(line);
    if url.is_empty() { None } else { Some(url) }
}

/// Merge seeds from `--url`, `--hosts-file` and saved sources, in that order
pub fn collect_seed_urls(
    cli_urls: &[String],
    hosts_file: Option<&PathBuf>,
    sources: &[SitemapSource],
) -> Result<Vec<String>, String> {
    let mut urls: Vec<String> = cli_urls.iter().filter_map(|u| parse_url_line(u)).collect();

    if let Some(path) = hosts_file {
        urls.extend(load_urls_from_file(path)?);
    }

    urls.extend(sources.iter().map(|s| s.url.clone()));

    if urls.is_empty() {
        return Err(
            "Provide at least one of --url, --hosts-file, --source or --all-sources".to_string(),
        );
    }

    Ok(urls)
}

fn parse_format(args: &ArgMatches) -> Result<ReportFormat, String> {
    let raw = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    ReportFormat::from_str(raw).ok_or_else(|| format!("Unknown output format '{}'", raw))
}

fn open_database(config_dir: &Path, config: &Config) -> Result<Database, String> {
    let path = database_path(config_dir);
    debug!("Opening database at {}", path.display());
    Database::new(&path)
        .map(|db| db.with_result_capacity(config.result_capacity))
        .map_err(|e| format!("Failed to open database {}: {}", path.display(), e))
}

fn load_config(config_dir: &Path) -> Result<Config, String> {
    Config::load(config_dir).map_err(|e| {
        format!(
            "Failed to read {}: {}",
            config_dir.join(CONFIG_FILE_NAME).display(),
            e
        )
    })
}

fn print_divider() {
    eprintln!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    eprint!("{} ", msg.bright_cyan().bold());
    let _ = io::stderr().flush();
    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        return String::new();
    }
    response.trim().to_lowercase()
}

fn emit_report(
    report: &CrawlReport,
    format: ReportFormat,
    output: Option<&PathBuf>,
    quiet: bool,
) -> HandlerResult {
    match output {
        Some(path) => {
            write_report(path, format, report)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            if !quiet {
                eprintln!(
                    "{} Saved {} URLs to {}",
                    "✓".green().bold(),
                    report.total,
                    path.display()
                );
            }
        }
        None => {
            let rendered = render_report(report, format).map_err(|e| e.to_string())?;
            print!("{}", rendered);
            if format == ReportFormat::Json {
                println!();
            }
        }
    }
    Ok(())
}

pub fn handle_init(args: &ArgMatches, config_dir: &Path) -> HandlerResult {
    let force = args.get_flag("force");
    let db_path = database_path(config_dir);
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    if (Database::exists(&db_path) || config_path.exists()) && !force {
        eprintln!("{} Configuration already exists:", "⚠".yellow().bold());
        if Database::exists(&db_path) {
            eprintln!("  - Database: {}", db_path.display());
        }
        if config_path.exists() {
            eprintln!("  - Config: {}", config_path.display());
        }
        eprintln!("This will remove saved sources and stored results.");

        let response = print_prompt("Do you want to continue? [y/N]:");
        if response != "y" && response != "yes" {
            eprintln!("\nInitialization cancelled.");
            return Ok(());
        }
    }

    if Database::exists(&db_path) {
        Database::drop(&db_path)
            .map_err(|e| format!("Failed to remove {}: {}", db_path.display(), e))?;
    }

    let config = Config::default();
    config
        .save(config_dir)
        .map_err(|e| format!("Failed to write {}: {}", config_path.display(), e))?;
    open_database(config_dir, &config)?;

    print_divider();
    eprintln!("{} Created {}", "✓".green().bold(), config_path.display());
    eprintln!("{} Created {}", "✓".green().bold(), db_path.display());
    print_divider();
    Ok(())
}

pub fn handle_sources_add(args: &ArgMatches, config_dir: &Path) -> HandlerResult {
    let url = args
        .get_one::<String>("URL")
        .ok_or_else(|| "A sitemap URL is required".to_string())?;
    let label = args.get_one::<String>("label").map(String::as_str).unwrap_or("");

    let config = load_config(config_dir)?;
    let db = open_database(config_dir, &config)?;
    let source = db.add_source(url, label).map_err(|e| e.to_string())?;

    eprintln!(
        "{} Added {} {}",
        "✓".green().bold(),
        source.url.bright_white(),
        format!("({})", source.id).dimmed()
    );
    Ok(())
}

pub fn handle_sources_remove(args: &ArgMatches, config_dir: &Path) -> HandlerResult {
    let id = args
        .get_one::<String>("ID")
        .ok_or_else(|| "A source id is required".to_string())?;

    let config = load_config(config_dir)?;
    let db = open_database(config_dir, &config)?;
    if db.remove_source(id).map_err(|e| e.to_string())? {
        eprintln!("{} Removed source {}", "✓".green().bold(), id);
        Ok(())
    } else {
        Err(format!("No source with id '{}'", id))
    }
}

pub fn handle_sources_list(config_dir: &Path) -> HandlerResult {
    let config = load_config(config_dir)?;
    let db = open_database(config_dir, &config)?;
    let sources = db.list_sources().map_err(|e| e.to_string())?;

    if sources.is_empty() {
        eprintln!("No saved sitemaps. Add one with `sitemapper sources add <URL>`.");
        return Ok(());
    }

    for source in sources {
        println!("{}  {}  {}", source.id.dimmed(), source.label.bold(), source.url);
    }
    Ok(())
}

pub fn handle_sources_import(args: &ArgMatches, config_dir: &Path) -> HandlerResult {
    let path = args
        .get_one::<PathBuf>("FILE")
        .ok_or_else(|| "An import file is required".to_string())?;
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let config = load_config(config_dir)?;
    let db = open_database(config_dir, &config)?;
    let imported = db
        .import_sources_json(&json)
        .map_err(|e| format!("Failed to import {}: {}", path.display(), e))?;

    eprintln!(
        "{} Imported {} sitemap(s) from {}",
        "✓".green().bold(),
        imported,
        path.display()
    );
    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches, config_dir: &Path, quiet: bool) -> HandlerResult {
    let config = load_config(config_dir)?;
    let format = parse_format(args)?;
    let store = !args.get_flag("no-store");
    let all_sources = args.get_flag("all-sources");
    let source_ids: Vec<String> = args
        .get_many::<String>("source")
        .map(|ids| ids.cloned().collect())
        .unwrap_or_default();

    let db = if store || all_sources || !source_ids.is_empty() {
        Some(open_database(config_dir, &config)?)
    } else {
        None
    };

    let sources = match db.as_ref() {
        Some(db) if all_sources => db.list_sources().map_err(|e| e.to_string())?,
        Some(db) if !source_ids.is_empty() => {
            let found = db.get_sources(&source_ids).map_err(|e| e.to_string())?;
            for id in source_ids.iter().filter(|id| !found.iter().any(|s| &s.id == *id)) {
                warn!("Unknown source id {}", id);
                eprintln!("{} No source with id '{}', skipping", "⚠".yellow(), id);
            }
            found
        }
        _ => Vec::new(),
    };

    let cli_urls: Vec<String> = args
        .get_many::<String>("url")
        .map(|urls| urls.cloned().collect())
        .unwrap_or_default();
    let urls = collect_seed_urls(&cli_urls, args.get_one::<PathBuf>("hosts-file"), &sources)?;

    let options = CrawlOptions {
        urls,
        max_depth: args
            .get_one::<u64>("max-depth")
            .map(|d| *d as usize)
            .unwrap_or(config.max_depth),
        limit: args
            .get_one::<u64>("limit")
            .and_then(|l| NonZeroUsize::new(*l as usize)),
        timeout_secs: args
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(config.timeout_secs),
        user_agent: config.user_agent.clone(),
        show_progress: !quiet,
    };

    if !quiet {
        print_divider();
        eprintln!(
            "{} Crawling {} sitemap(s), max depth {}",
            "→".blue(),
            options.urls.len(),
            options.max_depth
        );
    }

    let mut report = execute_crawl(options, None)
        .await
        .map_err(|e| format!("Crawl failed: {}", e))?;

    if let Some(db) = db.as_ref().filter(|_| store) {
        let token = db
            .put_result(&report.to_result(), report.sources, report.elapsed_ms)
            .map_err(|e| format!("Failed to store result: {}", e))?;
        report = report.with_token(token);
    }

    if !quiet {
        eprint!("{}", generate_crawl_summary(&report));
    }

    emit_report(&report, format, args.get_one::<PathBuf>("output"), quiet)
}

pub fn handle_results_list(config_dir: &Path) -> HandlerResult {
    let config = load_config(config_dir)?;
    let db = open_database(config_dir, &config)?;
    let tokens = db.list_result_tokens().map_err(|e| e.to_string())?;

    if tokens.is_empty() {
        eprintln!("No stored results.");
    }
    for token in tokens {
        println!("{}", token);
    }
    Ok(())
}

pub fn handle_results_export(args: &ArgMatches, config_dir: &Path, quiet: bool) -> HandlerResult {
    let token = args
        .get_one::<String>("TOKEN")
        .ok_or_else(|| "A result token is required".to_string())?;
    let format = parse_format(args)?;

    let config = load_config(config_dir)?;
    let db = open_database(config_dir, &config)?;
    let stored = db
        .get_result(token)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No stored result for token '{}'", token))?;

    emit_report(
        &CrawlReport::from(stored),
        format,
        args.get_one::<PathBuf>("output"),
        quiet,
    )
}
