//! edgectl CLI entry point
//!
//! Parses the command line, sets up logging and runs the selected command:
//! - `update` - Replace this binary with the latest release
//! - `version` - Show the version and configuration freshness
//! - `config` - Inspect the local configuration
//!
//! The process exits only after the command has finished and any background
//! configuration refresh has been settled.

use clap::Parser;
use edgectl::cli;
use edgectl::utils::init_logging;

#[tokio::main]
async fn main() {
    // Parse CLI arguments; argument errors exit with 1 like any failed command
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => std::process::exit(cli::report_parse_error(&e)),
    };

    init_logging(cli.is_verbose(), cli.is_quiet());

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let exit_code = cli.execute().await;
    std::process::exit(exit_code);
}
