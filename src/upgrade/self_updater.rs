use anyhow::{Context, Result};
use semver::Version;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::CURRENT_VERSION;
use crate::core::EdgeError;
use crate::upgrade::replace::{ReplaceFs, ReplaceStrategy, StdFs, platform_strategy, replace_executable};
use crate::upgrade::versioner::Versioner;

/// Result of comparing the running version with the latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    /// Version of the running binary
    pub current: Version,
    /// Newest published version
    pub latest: Version,
}

impl UpdateCheck {
    /// Whether the latest release is newer than the running binary.
    pub fn is_update_available(&self) -> bool {
        self.latest > self.current
    }
}

/// What [`SelfUpdater::run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Nothing newer was published; nothing was downloaded.
    UpToDate {
        /// Version of the running binary
        current: Version,
        /// Newest published version
        latest: Version,
    },
    /// The executable was replaced.
    Updated {
        /// Version that was running
        previous: Version,
        /// Version now at the executable path
        installed: Version,
        /// The replaced executable
        path: PathBuf,
    },
}

/// Replaces the running edgectl binary with the latest release.
///
/// The updater is a short pipeline:
///
/// 1. ask the [`Versioner`] for the latest version and stop when it is not
///    newer than the running one
/// 2. download it into a staging directory, which is removed again however
///    the update ends
/// 3. resolve the absolute path of the running executable
/// 4. hand both to [`replace_executable`] with the platform's
///    [`ReplaceStrategy`]
///
/// The file system and strategy are injectable so every replacement step can
/// be made to fail in tests.
///
/// # Examples
///
/// ```rust,no_run
/// use edgectl::upgrade::{GitHubVersioner, SelfUpdater, UpdateStatus};
///
/// # async fn example() -> anyhow::Result<()> {
/// let updater = SelfUpdater::new(GitHubVersioner::new()?)?;
///
/// match updater.run().await? {
///     UpdateStatus::UpToDate { .. } => println!("No update required."),
///     UpdateStatus::Updated { installed, .. } => println!("Updated to {installed}"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct SelfUpdater<V: Versioner> {
    versioner: V,
    current: Version,
    fs: Arc<dyn ReplaceFs>,
    strategy: &'static dyn ReplaceStrategy,
    executable: Option<PathBuf>,
}

impl<V: Versioner> SelfUpdater<V> {
    /// An updater for the running binary, using the real file system and
    /// the platform's replacement strategy.
    pub fn new(versioner: V) -> Result<Self> {
        let current = Version::parse(CURRENT_VERSION).map_err(|_| EdgeError::InvalidVersion {
            version: CURRENT_VERSION.to_string(),
        })?;

        Ok(Self {
            versioner,
            current,
            fs: Arc::new(StdFs),
            strategy: platform_strategy(),
            executable: None,
        })
    }

    /// Pretend to be running `version`.
    pub fn with_current_version(mut self, version: Version) -> Self {
        self.current = version;
        self
    }

    /// Replace `path` instead of the running executable.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Perform file operations through `fs`.
    pub fn with_fs(mut self, fs: Arc<dyn ReplaceFs>) -> Self {
        self.fs = fs;
        self
    }

    /// Use `strategy` instead of the platform default.
    pub fn with_strategy(mut self, strategy: &'static dyn ReplaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Version of the running binary.
    pub fn current_version(&self) -> &Version {
        &self.current
    }

    /// Compare the running version with the latest release.
    pub async fn check(&self) -> Result<UpdateCheck> {
        let latest = self.versioner.latest_version().await?;
        debug!("Current version {}, latest version {latest}", self.current);

        Ok(UpdateCheck {
            current: self.current.clone(),
            latest,
        })
    }

    /// Download `version` and put it at the executable path.
    ///
    /// # Returns
    ///
    /// The path of the replaced executable.
    ///
    /// # Errors
    ///
    /// - the download or its checksum verification fails
    /// - the executable path cannot be resolved
    /// - any replacement step fails, as a [`ReplaceError`](crate::upgrade::ReplaceError);
    ///   the previous binary is left in place or restored
    pub async fn install(&self, version: &Version) -> Result<PathBuf> {
        let staged = self.versioner.download(version).await?;
        let target = self.executable_path()?;
        info!("Installing edgectl {version} to {}", target.display());

        let fs = Arc::clone(&self.fs);
        let strategy = self.strategy;
        let staged_path = staged.path().to_path_buf();
        let replace_target = target.clone();
        tokio::task::spawn_blocking(move || {
            replace_executable(fs.as_ref(), strategy, &staged_path, &replace_target)
        })
        .await
        .context("Replacement task failed")??;

        // The staging directory goes away with `staged`.
        drop(staged);
        Ok(target)
    }

    /// Check for a newer release and install it if there is one.
    pub async fn run(&self) -> Result<UpdateStatus> {
        let check = self.check().await?;
        if !check.is_update_available() {
            return Ok(UpdateStatus::UpToDate {
                current: check.current,
                latest: check.latest,
            });
        }

        let path = self.install(&check.latest).await?;
        Ok(UpdateStatus::Updated {
            previous: check.current,
            installed: check.latest,
            path,
        })
    }

    fn executable_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.executable {
            return Ok(path.clone());
        }

        let exe = std::env::current_exe().map_err(|e| EdgeError::ExecutablePath {
            reason: e.to_string(),
        })?;
        let resolved = exe.canonicalize().map_err(|e| EdgeError::ExecutablePath {
            reason: format!("{}: {e}", exe.display()),
        })?;
        Ok(resolved)
    }
}
