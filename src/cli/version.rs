//! `edgectl version`: the running version and how fresh the configuration is.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;

use crate::cli::CommandContext;
use crate::config::ConfigDocument;
use crate::constants::{BIN_NAME, CURRENT_VERSION};
use crate::core::EdgeError;

/// Show the edgectl version and configuration freshness.
#[derive(Args, Debug)]
pub struct VersionCommand {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct VersionReport<'a> {
    version: &'a str,
    config: Freshness<'a>,
}

#[derive(Debug, Serialize)]
struct Freshness<'a> {
    last_checked: &'a str,
    ttl: &'a str,
    remote_config: &'a str,
    stale: bool,
}

impl<'a> VersionReport<'a> {
    fn new(document: &'a ConfigDocument) -> Self {
        Self {
            version: CURRENT_VERSION,
            config: Freshness {
                last_checked: &document.cli.last_checked,
                ttl: &document.cli.ttl,
                remote_config: &document.cli.remote_config,
                stale: document.is_stale_at(Utc::now()),
            },
        }
    }

    fn to_text(&self) -> String {
        let freshness = if self.config.stale { " (refreshing)" } else { "" };
        format!(
            "{BIN_NAME} {}\nConfiguration last checked: {}{freshness}\nConfiguration TTL: {}\nConfiguration source: {}",
            self.version, self.config.last_checked, self.config.ttl, self.config.remote_config
        )
    }
}

impl VersionCommand {
    /// Print the version report.
    ///
    /// JSON output is meant for scripts, so it cannot be mixed with the
    /// lifecycle messages of `--verbose`.
    pub fn execute(self, document: &ConfigDocument, context: &CommandContext) -> Result<()> {
        println!("{}", self.render(document, context.reporter.is_verbose())?);
        Ok(())
    }

    fn render(&self, document: &ConfigDocument, verbose: bool) -> Result<String> {
        if self.json && verbose {
            return Err(EdgeError::InvalidFlagCombination {
                flags: "--verbose and --json".to_string(),
            }
            .into());
        }

        let report = VersionReport::new(document);
        if self.json {
            serde_json::to_string_pretty(&report).context("Failed to serialize version report")
        } else {
            Ok(report.to_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FIXTURE_REMOTE_CONFIG, fresh_document, stale_document};

    #[test]
    fn test_text_output() {
        let text = VersionCommand {
            json: false,
        }
        .render(&fresh_document("1h"), false)
        .unwrap();

        assert!(text.starts_with(&format!("edgectl {CURRENT_VERSION}\n")));
        assert!(text.contains("Configuration TTL: 1h"));
        assert!(text.contains(FIXTURE_REMOTE_CONFIG));
        assert!(!text.contains("(refreshing)"));
    }

    #[test]
    fn test_json_output_reports_staleness() {
        let json = VersionCommand {
            json: true,
        }
        .render(&stale_document(), false)
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], CURRENT_VERSION);
        assert_eq!(value["config"]["ttl"], "5m");
        assert_eq!(value["config"]["stale"], true);
    }

    #[test]
    fn test_json_with_verbose_is_rejected() {
        let err = VersionCommand {
            json: true,
        }
        .render(&fresh_document("1h"), true)
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EdgeError>(),
            Some(EdgeError::InvalidFlagCombination { .. })
        ));
    }
}
