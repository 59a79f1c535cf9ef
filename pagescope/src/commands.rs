use crate::CLAP_STYLING;
use clap::{arg, command};
use pagescope::DEFAULT_BIND_ADDR;
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("pagescope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pagescope")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress progress and non-essential output")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("analyze")
                .about(
                    "Fetch a page, report its doctype, title, headings and login form, and \
                verify every external link.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to analyze")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown", "md"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: print to stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"config" <PATH>)
                        .required(false)
                        .help("Path to a JSON analyzer config file"),
                )
                .arg(
                    arg!(--"concurrency" <NUM>)
                        .required(false)
                        .help("Maximum number of link probes in flight at once")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help("Give up on unfinished link probes after this many seconds")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            command!("serve")
                .about("Run the HTTP API (GET /health-check, POST /scraper)")
                .arg(
                    arg!(-b --"bind" <ADDR>)
                        .required(false)
                        .help("Address to listen on")
                        .default_value(DEFAULT_BIND_ADDR),
                )
                .arg(
                    arg!(--"config" <PATH>)
                        .required(false)
                        .help("Path to a JSON analyzer config file"),
                ),
        )
}
