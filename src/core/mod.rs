//! Core types shared by every part of edgectl.
//!
//! At the moment this is the error system:
//! - [`EdgeError`] - enumerated failures of the bootstrap, refresh and self-update flows
//! - [`ErrorContext`] - an error paired with a suggested next action (a *remediable* error)
//! - [`user_friendly_error`] - convert any `anyhow::Error` into an [`ErrorContext`]
//!
//! # Error Handling Pattern
//!
//! ```rust,no_run
//! use edgectl::core::user_friendly_error;
//!
//! fn run() -> anyhow::Result<()> {
//!     anyhow::bail!("something failed")
//! }
//!
//! if let Err(e) = run() {
//!     user_friendly_error(e).display();
//!     std::process::exit(1);
//! }
//! ```

pub mod error;

pub use error::{
    BUG_REMEDIATION, CONFIG_REMEDIATION, EdgeError, ErrorContext, FLAGS_REMEDIATION,
    MANUAL_UPDATE_REMEDIATION, NETWORK_REMEDIATION, PERMISSION_REMEDIATION, user_friendly_error,
};
