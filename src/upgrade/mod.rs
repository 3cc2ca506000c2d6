//! Self-update of the edgectl binary.
//!
//! `edgectl update` replaces the running executable with the latest GitHub
//! release. The work is split into small pieces that can be tested on their
//! own:
//!
//! - **[`Versioner`]**: where releases come from ([`GitHubVersioner`] by default)
//! - **[`archive`]** and **[`verification`]**: unpacking a release archive after
//!   checking it against the published SHA-256 sums
//! - **[`replace`]**: moving the staged binary onto the executable path through
//!   a platform [`ReplaceStrategy`]
//! - **[`SelfUpdater`]**: the pipeline tying them together
//!
//! # Update Process Flow
//!
//! ```text
//! 1. Version check
//!    └── latest <= current: "No update required." and stop
//!
//! 2. Download (staging directory, removed on every exit path)
//!    ├── Fetch edgectl_v<version>_<os>-<arch>.tar.gz (.zip on Windows)
//!    ├── Verify against edgectl_v<version>_SHA256SUMS when published
//!    └── Extract the binary
//!
//! 3. Replacement
//!    ├── windows-rename-then-replace: path -> path~ first
//!    ├── Rename staged binary onto path
//!    ├── Fallback: copy to path.partial, flush, rename onto path
//!    └── Failure: restore path~ (Windows), report with remediation
//! ```
//!
//! # Guarantees
//!
//! At every point the executable path holds either the previous or the new
//! binary, as long as the process is not killed between the aside rename and
//! the restore. A crash in that window leaves `path~` behind for manual
//! recovery; it is never deleted automatically.

pub mod archive;
pub mod replace;
pub mod self_updater;
pub mod verification;
pub mod versioner;

pub use replace::{
    PosixRename, ReplaceError, ReplaceFs, ReplaceStrategy, StdFs, WindowsRenameThenReplace,
    platform_strategy, replace_executable,
};
pub use self_updater::{SelfUpdater, UpdateCheck, UpdateStatus};
pub use verification::ChecksumVerifier;
pub use versioner::{GitHubVersioner, StagedBinary, Versioner};
