//! Replacing the running executable with a staged binary.
//!
//! The replacement is built from a handful of file system steps:
//!
//! ```text
//! aside-rename   path -> path~                   (Windows only)
//! rename         staged -> path
//!   on failure:
//!   copy         staged -> path.partial
//!   flush        fsync path.partial
//!   promote      path.partial -> path
//! restore        path~ -> path                   (Windows only, after a failure)
//! ```
//!
//! A failure at any step leaves either the previous or the new binary at
//! `path`. The partial copy is written next to the target so a failed copy
//! never truncates the binary that is already there. Only a crash between the
//! aside-rename and the rename can leave nothing at `path`; the previous binary
//! then remains at `path~` for manual recovery.
//!
//! File system access goes through [`ReplaceFs`] so every step can be made to
//! fail in tests.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::constants::ASIDE_SUFFIX;

/// Suffix of the sibling file used by the copy fallback.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Why the executable could not be replaced.
#[derive(Error, Debug)]
pub enum ReplaceError {
    /// The running binary could not be moved aside.
    #[error("Failed to move {} aside to {}: {source}", path.display(), aside.display())]
    MoveAside {
        /// The executable
        path: PathBuf,
        /// Where it was being moved
        aside: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Both the rename and the fallback copy failed.
    #[error("Failed to copy the new binary to {}: {source}", path.display())]
    Copy {
        /// Destination of the copy
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The copied binary could not be flushed to storage.
    #[error("Failed to flush the new binary at {} to disk: {source}", path.display())]
    Flush {
        /// The copied file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The copied binary could not be moved onto the executable path.
    #[error("Failed to move the new binary into place at {}: {source}", path.display())]
    Promote {
        /// The executable
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Replacement failed and the moved-aside binary could not be put back.
    #[error("{failure}; the previous binary is still at {}", aside.display())]
    RestoreFailed {
        /// The failure that triggered the restore
        failure: Box<ReplaceError>,
        /// Where the previous binary is
        aside: PathBuf,
    },
}

impl ReplaceError {
    /// Whether a binary is still present at the executable path.
    pub fn original_intact(&self) -> bool {
        !matches!(self, Self::RestoreFailed { .. })
    }
}

/// File system operations used during replacement.
pub trait ReplaceFs: Send + Sync {
    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Delete a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Copy the contents and permissions of `from` to `to`.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Flush `path` to storage.
    fn sync(&self, path: &Path) -> io::Result<()>;
}

/// [`ReplaceFs`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl ReplaceFs for StdFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn sync(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new().write(true).open(path)?.sync_all()
    }
}

/// Platform-specific steps around the installation of the new binary.
pub trait ReplaceStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run before the new binary is installed.
    fn prepare(&self, fs: &dyn ReplaceFs, target: &Path) -> Result<(), ReplaceError>;

    /// Run after the installation failed with `failure`.
    fn recover(&self, fs: &dyn ReplaceFs, target: &Path, failure: ReplaceError) -> ReplaceError;
}

/// Posix systems can rename over a running executable; no extra steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixRename;

impl ReplaceStrategy for PosixRename {
    fn name(&self) -> &'static str {
        "posix-rename"
    }

    fn prepare(&self, _fs: &dyn ReplaceFs, _target: &Path) -> Result<(), ReplaceError> {
        Ok(())
    }

    fn recover(&self, _fs: &dyn ReplaceFs, _target: &Path, failure: ReplaceError) -> ReplaceError {
        failure
    }
}

/// Windows locks a running executable against overwriting but allows renaming
/// it, so the binary is first moved to `path~`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsRenameThenReplace;

impl ReplaceStrategy for WindowsRenameThenReplace {
    fn name(&self) -> &'static str {
        "windows-rename-then-replace"
    }

    fn prepare(&self, fs: &dyn ReplaceFs, target: &Path) -> Result<(), ReplaceError> {
        let aside = aside_path(target);
        debug!("Moving {} aside to {}", target.display(), aside.display());

        fs.rename(target, &aside).map_err(|source| {
            // A failed rename may still leave a remnant behind
            if fs.remove_file(&aside).is_ok() {
                debug!("Removed remnant {}", aside.display());
            }
            ReplaceError::MoveAside {
                path: target.to_path_buf(),
                aside: aside.clone(),
                source,
            }
        })
    }

    fn recover(&self, fs: &dyn ReplaceFs, target: &Path, failure: ReplaceError) -> ReplaceError {
        let aside = aside_path(target);
        match fs.rename(&aside, target) {
            Ok(()) => {
                warn!("Restored {} after a failed update", target.display());
                failure
            }
            Err(e) => {
                error!("Failed to restore {} from {}: {e}", target.display(), aside.display());
                ReplaceError::RestoreFailed {
                    failure: Box::new(failure),
                    aside,
                }
            }
        }
    }
}

/// The strategy for the platform edgectl was built for.
pub fn platform_strategy() -> &'static dyn ReplaceStrategy {
    if cfg!(windows) { &WindowsRenameThenReplace } else { &PosixRename }
}

/// `path~`, where a running Windows executable is moved during replacement.
pub fn aside_path(target: &Path) -> PathBuf {
    with_suffix(target, ASIDE_SUFFIX)
}

/// `path.partial`, where the copy fallback writes before promoting.
pub fn partial_path(target: &Path) -> PathBuf {
    with_suffix(target, PARTIAL_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Replace the executable at `target` with the binary at `staged`.
///
/// `strategy` prepares the target first (a no-op on Posix, moving it aside on
/// Windows). The staged binary is then renamed into place, or copied to
/// `<target>.partial`, flushed and promoted when the rename fails.
///
/// # Errors
///
/// Returns the [`ReplaceError`] of the first failing step after the strategy
/// has tried to put the original executable back.
pub fn replace_executable(
    fs: &dyn ReplaceFs,
    strategy: &dyn ReplaceStrategy,
    staged: &Path,
    target: &Path,
) -> Result<(), ReplaceError> {
    debug!("Replacing {} using {}", target.display(), strategy.name());

    strategy.prepare(fs, target)?;
    install(fs, staged, target).map_err(|failure| strategy.recover(fs, target, failure))
}

fn install(fs: &dyn ReplaceFs, staged: &Path, target: &Path) -> Result<(), ReplaceError> {
    let rename_error = match fs.rename(staged, target) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    debug!("Rename into place failed ({rename_error}); falling back to copy");

    let partial = partial_path(target);
    let discard_partial = || {
        let _ = fs.remove_file(&partial);
    };

    if let Err(source) = fs.copy(staged, &partial) {
        discard_partial();
        return Err(ReplaceError::Copy {
            path: partial,
            source,
        });
    }
    if let Err(source) = fs.sync(&partial) {
        discard_partial();
        return Err(ReplaceError::Flush {
            path: partial,
            source,
        });
    }
    if let Err(source) = fs.rename(&partial, target) {
        discard_partial();
        return Err(ReplaceError::Promote {
            path: target.to_path_buf(),
            source,
        });
    }
    Ok(())
}
