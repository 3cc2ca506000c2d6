//! Keeping the local configuration usable and up to date.
//!
//! Every run goes through two phases:
//!
//! 1. [`load_or_repair`] runs before the command. It reads the local document
//!    and, when the file is missing, outdated or corrupt, fetches and persists a
//!    new one. The command does not start until this succeeds.
//! 2. [`BackgroundRefresh`] runs alongside the command when the document is
//!    stale, and is finalized exactly once before the process exits.

pub mod bootstrap;
pub mod coordinator;

pub use bootstrap::load_or_repair;
pub use coordinator::{BackgroundRefresh, RefreshOutcome};
