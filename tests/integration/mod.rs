//! Integration test suite for edgectl
//!
//! These tests run the compiled `edgectl` binary against a temporary
//! configuration file and local HTTP servers.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **bootstrap**: creating, upgrading and failing to create the configuration
//! - **refresh**: background refresh of a stale configuration
//! - **commands**: `version` and `config` output

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod bootstrap;
mod commands;
mod refresh;
