use crate::CLAP_STYLING;
use clap::{ArgAction, arg, command};
use sitemapper_core::crawl::MAX_DEPTH_LIMIT;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitemapper")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitemapper")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"config-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory holding config.json and the sitemapper database")
                .default_value(sitemapper::handlers::DEFAULT_CONFIG_DIR),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the sitemapper config directory and database")
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing database and config without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("sources")
                .about("Manage saved sitemap sources")
                .subcommand(
                    command!("add")
                        .about("Save a sitemap URL")
                        .arg(arg!(<URL>).help("The sitemap URL (scheme defaults to https)"))
                        .arg(
                            arg!(-l --"label" <LABEL>)
                                .required(false)
                                .help("A friendly name for the sitemap"),
                        ),
                )
                .subcommand(
                    command!("remove")
                        .about("Remove a saved sitemap")
                        .arg(arg!(<ID>).help("The id of the sitemap source")),
                )
                .subcommand(command!("list").about("List saved sitemaps"))
                .subcommand(
                    command!("import")
                        .about("Import sitemaps from a JSON list")
                        .arg(
                            arg!(<FILE>)
                                .help("Path to a JSON file of {url, label} entries")
                                .value_parser(clap::value_parser!(std::path::PathBuf)),
                        ),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Collect page URLs from one or more sitemaps, following nested sitemap \
                indexes.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .action(ArgAction::Append)
                        .help("A sitemap URL to crawl (repeatable)"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of sitemap URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-s --"source" <ID>)
                        .required(false)
                        .action(ArgAction::Append)
                        .help("Crawl a saved sitemap source by id (repeatable)")
                        .conflicts_with("all-sources"),
                )
                .arg(
                    arg!(--"all-sources")
                        .required(false)
                        .help("Crawl every saved sitemap source")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("How many levels of nested sitemap indexes to follow (default: 5)")
                        .value_parser(clap::value_parser!(u64).range(1..=MAX_DEPTH_LIMIT as u64)),
                )
                .arg(
                    arg!(-l --"limit" <COUNT>)
                        .required(false)
                        .help("Stop after collecting this many URLs")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds (default: 20)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save URLs to file (default: print to stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"no-store")
                        .required(false)
                        .help("Do not keep this result for later export")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("results")
                .about("Work with stored crawl results")
                .subcommand(command!("list").about("List stored result tokens, newest first"))
                .subcommand(
                    command!("export")
                        .about("Export a stored crawl result")
                        .arg(arg!(<TOKEN>).help("The token printed after a crawl"))
                        .arg(
                            arg!(-o --"output" <PATH>)
                                .required(false)
                                .help("Save to file (default: print to stdout)")
                                .value_parser(clap::value_parser!(std::path::PathBuf)),
                        )
                        .arg(
                            arg!(-f --"format" <FORMAT>)
                                .required(false)
                                .help("Output format: text, json, csv")
                                .value_parser(["text", "json", "csv"])
                                .default_value("text"),
                        ),
                ),
        )
}
