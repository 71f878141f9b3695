use colored::Colorize;
use commands::command_argument_builder;
use sitemapper::handlers::{
    DEFAULT_CONFIG_DIR, HandlerResult, handle_crawl, handle_init, handle_results_export,
    handle_results_list, handle_sources_add, handle_sources_import, handle_sources_list,
    handle_sources_remove, resolve_config_dir,
};
use sitemapper_core::print_banner;
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let config_dir = resolve_config_dir(
        chosen_command
            .get_one::<String>("config-dir")
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONFIG_DIR),
    );

    let outcome: HandlerResult = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command, &config_dir),
        Some(("sources", primary_command)) => match primary_command.subcommand() {
            Some(("add", secondary_command)) => handle_sources_add(secondary_command, &config_dir),
            Some(("remove", secondary_command)) => {
                handle_sources_remove(secondary_command, &config_dir)
            }
            Some(("list", _)) => handle_sources_list(&config_dir),
            Some(("import", secondary_command)) => {
                handle_sources_import(secondary_command, &config_dir)
            }
            _ => Err("Expected one of: add, remove, list, import".to_string()),
        },
        Some(("crawl", primary_command)) => handle_crawl(primary_command, &config_dir, quiet).await,
        Some(("results", primary_command)) => match primary_command.subcommand() {
            Some(("list", _)) => handle_results_list(&config_dir),
            Some(("export", secondary_command)) => {
                handle_results_export(secondary_command, &config_dir, quiet)
            }
            _ => Err("Expected one of: list, export".to_string()),
        },
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(message) = outcome {
        eprintln!("{} {}", "✗".red().bold(), message);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
