//! `edgectl update`: replace the running binary with the latest release.

use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::cli::CommandContext;
use crate::upgrade::{GitHubVersioner, SelfUpdater, Versioner};
use crate::utils::{Reporter, Spinner};

/// Update edgectl to the latest release.
///
/// # Examples
///
/// ```bash
/// # See whether a newer release exists
/// edgectl update --check
///
/// # Install it
/// edgectl update
/// ```
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Only report the current and latest versions
    #[arg(long)]
    pub check: bool,
}

impl UpdateCommand {
    /// Run against the official GitHub releases.
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let updater = SelfUpdater::new(GitHubVersioner::new()?)?;
        self.execute_with(&updater, context.reporter).await
    }

    /// Run with an explicit updater.
    pub async fn execute_with<V: Versioner>(self, updater: &SelfUpdater<V>, reporter: Reporter) -> Result<()> {
        let spinner = Spinner::start("Checking for the latest edgectl release...", reporter.is_quiet());
        let check = updater.check().await;
        spinner.finish();
        let check = check?;

        reporter.status(format!("Current version: {}", check.current));
        reporter.status(format!("Latest version: {}", check.latest));

        if !check.is_update_available() {
            reporter.status("No update required.");
            return Ok(());
        }
        if self.check {
            reporter.status(format!("Run `edgectl update` to install {}.", check.latest));
            return Ok(());
        }

        let spinner = Spinner::start(format!("Updating edgectl to {}...", check.latest), reporter.is_quiet());
        let installed = updater.install(&check.latest).await;
        spinner.finish();
        let path = installed?;

        debug!("Replaced {}", path.display());
        reporter.success(format!("Successfully updated to {}", check.latest));
        Ok(())
    }
}
