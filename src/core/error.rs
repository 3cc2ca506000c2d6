//! Error handling for edgectl
//!
//! This module provides the typed errors and the user-facing error reporting of the
//! CLI. It is built around two ideas:
//! 1. **Strongly-typed errors** ([`EdgeError`]) for precise handling in code
//! 2. **Remediable errors** ([`ErrorContext`]) that pair a failure with the action the
//!    user should take next
//!
//! # Error Categories
//!
//! - **Bootstrap**: [`EdgeError::ConfigBootstrapFailed`], [`EdgeError::ConfigCorrupt`]
//! - **Background refresh**: [`EdgeError::ConfigRefreshFailed`]
//! - **Self-update**: [`EdgeError::VersionCheckFailed`], [`EdgeError::DownloadFailed`],
//!   [`EdgeError::ExecutablePath`], [`EdgeError::ReplaceFailed`], ...
//! - **Flags**: [`EdgeError::InvalidFlagCombination`]
//! - **Everything else**: [`EdgeError::Other`]
//!
//! Use [`user_friendly_error`] to turn any `anyhow::Error` into an [`ErrorContext`]
//! with the matching remediation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use edgectl::core::{EdgeError, ErrorContext, NETWORK_REMEDIATION};
//!
//! let ctx = ErrorContext::new(EdgeError::ConfigBootstrapFailed {
//!     reason: "connection refused".to_string(),
//! })
//! .with_suggestion(NETWORK_REMEDIATION);
//!
//! ctx.display(); // red error, green suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::config::{FetchError, StoreError};
use crate::upgrade::ReplaceError;

/// Suggested action for failures that are most likely caused by the network.
pub const NETWORK_REMEDIATION: &str =
    "Check your network connection and proxy settings, then run the command again";

/// Suggested action for states that should be structurally impossible.
pub const BUG_REMEDIATION: &str = "If this persists, please file a bug report and include the output of the command run with --verbose";

/// Suggested action for file permission problems.
pub const PERMISSION_REMEDIATION: &str =
    "Check the file permissions, or re-run the command with elevated permissions (sudo/Administrator)";

/// Suggested action when the self-update cannot finish on its own.
pub const MANUAL_UPDATE_REMEDIATION: &str = "Download the latest release manually from https://github.com/edgectl/edgectl/releases and replace the edgectl binary";

/// Suggested action when the configuration file cannot be trusted.
pub const CONFIG_REMEDIATION: &str =
    "Remove the local configuration file and run any edgectl command to recreate it";

/// Suggested action for conflicting command-line flags.
pub const FLAGS_REMEDIATION: &str = "Use either --verbose or --json, not both";

/// Typed failures of the edgectl core.
#[derive(Error, Debug, Clone)]
pub enum EdgeError {
    /// The configuration could not be created or repaired at startup.
    ///
    /// No command runs after this error.
    #[error("Unable to load the edgectl configuration: {reason}")]
    ConfigBootstrapFailed {
        /// What went wrong while fetching or persisting the document
        reason: String,
    },

    /// A document was read or fetched successfully but is missing required values.
    #[error("The edgectl configuration is missing required values (cli.last_checked is empty)")]
    ConfigCorrupt {
        /// Where the document came from
        origin: String,
    },

    /// The background refresh of the configuration failed.
    #[error("There was a problem updating the versioning information for edgectl: {reason}")]
    ConfigRefreshFailed {
        /// Underlying failure
        reason: String,
    },

    /// The latest release could not be determined.
    #[error("Failed to check for the latest edgectl release: {reason}")]
    VersionCheckFailed {
        /// Underlying failure
        reason: String,
    },

    /// A version string could not be parsed.
    #[error("Invalid version: {version}")]
    InvalidVersion {
        /// The rejected version string
        version: String,
    },

    /// The release has no asset for this platform.
    #[error("Release {version} has no asset named {asset}")]
    NoReleaseAsset {
        /// Release version
        version: String,
        /// The asset that was looked for
        asset: String,
    },

    /// Downloading a release failed.
    #[error("Error downloading release {version}: {reason}")]
    DownloadFailed {
        /// Release version
        version: String,
        /// Underlying failure
        reason: String,
    },

    /// A downloaded archive did not match its published checksum.
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Archive name
        file: String,
        /// Published checksum
        expected: String,
        /// Computed checksum
        actual: String,
    },

    /// The path of the running executable could not be determined.
    #[error("Error determining the executable path: {reason}")]
    ExecutablePath {
        /// Underlying failure
        reason: String,
    },

    /// The running executable could not be replaced.
    #[error("Error moving the latest binary in place: {reason}")]
    ReplaceFailed {
        /// Underlying failure
        reason: String,
        /// Whether the original binary is still at its path
        original_intact: bool,
    },

    /// Two command-line flags that cannot be combined were given.
    #[error("Invalid flag combination: {flags}")]
    InvalidFlagCombination {
        /// The conflicting flags
        flags: String,
    },

    /// Any other failure, with its cause chain flattened into the message.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// An error paired with optional details and a suggested next action.
///
/// This is the form in which every failure reaches the user. The main command's
/// error and a failed background refresh are both rendered through it, the latter
/// as a warning.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: EdgeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: EdgeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);
        self.display_trailer();
    }

    /// Print the error to stderr as a warning.
    ///
    /// Used for failures that did not change the outcome of the command, such as a
    /// failed background refresh.
    pub fn display_as_warning(&self) {
        eprintln!("{}: {}", "warning".yellow().bold(), self.error);
        self.display_trailer();
    }

    fn display_trailer(&self) {
        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a remediation.
///
/// Known typed errors ([`EdgeError`], [`StoreError`], [`FetchError`],
/// [`ReplaceError`]) map to their specific suggestion. Unknown errors keep their
/// full cause chain in the details.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(edge_error) = error.downcast_ref::<EdgeError>() {
        return create_error_context(edge_error.clone());
    }

    if let Some(fetch_error) = error.downcast_ref::<FetchError>() {
        return ErrorContext::new(EdgeError::ConfigBootstrapFailed {
            reason: fetch_error.to_string(),
        })
        .with_suggestion(NETWORK_REMEDIATION);
    }

    if let Some(store_error) = error.downcast_ref::<StoreError>() {
        let suggestion = match store_error {
            StoreError::Io {
                source,
                ..
            } if source.kind() == std::io::ErrorKind::PermissionDenied => PERMISSION_REMEDIATION,
            _ => CONFIG_REMEDIATION,
        };
        return ErrorContext::new(EdgeError::ConfigBootstrapFailed {
            reason: store_error.to_string(),
        })
        .with_suggestion(suggestion);
    }

    if let Some(replace_error) = error.downcast_ref::<ReplaceError>() {
        return create_error_context(EdgeError::ReplaceFailed {
            reason: replace_error.to_string(),
            original_intact: replace_error.original_intact(),
        });
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(EdgeError::ReplaceFailed {
            reason: io_error.to_string(),
            original_intact: true,
        })
        .with_suggestion(PERMISSION_REMEDIATION);
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(EdgeError::Other {
        message,
    })
    .with_suggestion(BUG_REMEDIATION)
}

fn create_error_context(error: EdgeError) -> ErrorContext {
    match &error {
        EdgeError::ConfigBootstrapFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion(NETWORK_REMEDIATION)
            .with_details("edgectl needs its configuration file before it can run any command"),

        EdgeError::ConfigCorrupt {
            origin,
        } => {
            let details = format!("The configuration loaded from {origin} is incomplete");
            ErrorContext::new(error).with_suggestion(BUG_REMEDIATION).with_details(details)
        }

        EdgeError::ConfigRefreshFailed {
            ..
        } => ErrorContext::new(error).with_suggestion(BUG_REMEDIATION),

        EdgeError::VersionCheckFailed {
            ..
        }
        | EdgeError::DownloadFailed {
            ..
        } => ErrorContext::new(error).with_suggestion(NETWORK_REMEDIATION),

        EdgeError::ChecksumMismatch {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run the update again; if the mismatch persists, download the release manually")
            .with_details("The downloaded archive was discarded and the current binary was not modified"),

        EdgeError::InvalidVersion {
            ..
        }
        | EdgeError::NoReleaseAsset {
            ..
        }
        | EdgeError::ExecutablePath {
            ..
        } => ErrorContext::new(error).with_suggestion(MANUAL_UPDATE_REMEDIATION),

        EdgeError::ReplaceFailed {
            original_intact,
            ..
        } => {
            let details = if *original_intact {
                "The previous edgectl binary was left in place and is still usable"
            } else {
                "The previous edgectl binary was moved aside to a file ending in '~'; rename it back to restore it"
            };
            ErrorContext::new(error).with_suggestion(PERMISSION_REMEDIATION).with_details(details)
        }

        EdgeError::InvalidFlagCombination {
            ..
        } => ErrorContext::new(error).with_suggestion(FLAGS_REMEDIATION),

        EdgeError::Other {
            ..
        } => ErrorContext::new(error).with_suggestion(BUG_REMEDIATION),
    }
}
