//! Command-line interface for edgectl.
//!
//! Parsing is done with `clap` derive. Every subcommand runs inside a
//! [`Session`], so the configuration is loaded (or repaired) before it starts
//! and a pending background refresh is settled before the process exits.
//!
//! # Command Structure
//!
//! ```text
//! edgectl [--verbose | --quiet] [--config <PATH>] <COMMAND>
//!
//!   update [--check]        replace this binary with the latest release
//!   version [--json]        print the version and configuration freshness
//!   config path             print the configuration file location
//!   config show [--json]    print the effective configuration
//! ```
//!
//! # Global Options
//!
//! - `--verbose` (`-v`): announce configuration lifecycle events and enable
//!   debug logging
//! - `--quiet` (`-q`): only print errors and warnings
//! - `--config <PATH>`: use a different configuration file (also
//!   `EDGECTL_CONFIG_PATH`)

pub mod config;
pub mod update;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use crate::app::Session;
use crate::config::{ConfigDocument, ConfigStore, HttpFetcher};
use crate::constants::CONFIG_PATH_ENV;
use crate::core::user_friendly_error;
use crate::utils::Reporter;

/// Values every subcommand may need besides the configuration document.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Output gate for this invocation
    pub reporter: Reporter,
    /// Location of the configuration file
    pub config_path: PathBuf,
}

/// Root command of edgectl.
#[derive(Parser, Debug)]
#[command(
    name = "edgectl",
    about = "Manage edge platform services from the command line",
    version,
    long_about = "edgectl talks to the edge platform management API. It keeps a small local \
                  configuration that is refreshed in the background and can update itself."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show configuration lifecycle messages and debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors and warnings
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH", env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update edgectl to the latest release
    Update(update::UpdateCommand),

    /// Show the edgectl version and configuration freshness
    Version(version::VersionCommand),

    /// Inspect the local configuration
    Config(config::ConfigCommand),
}

impl Cli {
    /// Whether `--verbose` was given.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether `--quiet` was given.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The output gate for these flags.
    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.verbose, self.quiet)
    }

    /// Run the selected command and return the process exit code.
    ///
    /// Errors are printed here; the caller only has to exit with the code.
    pub async fn execute(self) -> i32 {
        let reporter = self.reporter();

        let store = match ConfigStore::resolve(self.config.clone()) {
            Ok(store) => store,
            Err(e) => {
                user_friendly_error(e).display();
                return 1;
            }
        };
        let fetcher = match HttpFetcher::new() {
            Ok(fetcher) => fetcher,
            Err(e) => {
                user_friendly_error(e).display();
                return 1;
            }
        };

        let context = CommandContext {
            reporter,
            config_path: store.path().to_path_buf(),
        };
        let session = Session::new(store, fetcher, reporter);
        let command = self.command;

        let report = session.run(|document| command.execute(document, context)).await;
        report.exit_code
    }
}

/// Print a command-line parse error and return the process exit code.
///
/// `--help` and `--version` exit with `0`. Every other parse error is an
/// unrecovered command error and exits with `1`.
pub fn report_parse_error(err: &clap::Error) -> i32 {
    // Nothing useful to do if stdout/stderr is closed
    let _ = err.print();
    parse_error_exit_code(err)
}

fn parse_error_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

impl Commands {
    async fn execute(self, document: ConfigDocument, context: CommandContext) -> Result<()> {
        match self {
            Self::Update(cmd) => cmd.execute(&context).await,
            Self::Version(cmd) => cmd.execute(&document, &context),
            Self::Config(cmd) => cmd.execute(&document, &context),
        }
    }
}
