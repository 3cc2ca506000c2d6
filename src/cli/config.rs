//! `edgectl config`: inspect the local configuration.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::cli::CommandContext;
use crate::config::{ConfigDocument, Environment};

/// Inspect the local configuration.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommands,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Print the location of the configuration file
    Path,

    /// Print the effective configuration
    ///
    /// `EDGECTL_API_TOKEN` and `EDGECTL_API_ENDPOINT` are applied and the
    /// token is masked.
    Show {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

impl ConfigCommand {
    /// Run the selected subcommand.
    pub fn execute(self, document: &ConfigDocument, context: &CommandContext) -> Result<()> {
        match self.command {
            ConfigSubcommands::Path => {
                println!("{}", context.config_path.display());
            }
            ConfigSubcommands::Show {
                json,
            } => {
                let output = render(document, &Environment::from_process(), json)?;
                println!("{}", output.trim_end());
            }
        }
        Ok(())
    }
}

fn render(document: &ConfigDocument, env: &Environment, json: bool) -> Result<String> {
    let effective = document.with_environment(env).redacted();
    if json {
        serde_json::to_string_pretty(&effective).context("Failed to serialize configuration as JSON")
    } else {
        toml::to_string_pretty(&effective).context("Failed to serialize configuration as TOML")
    }
}
