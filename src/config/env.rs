//! Configuration values supplied through environment variables.

use std::collections::HashMap;

use crate::constants::{API_ENDPOINT_ENV, API_TOKEN_ENV};

/// Overrides read from the process environment.
///
/// These never touch the document on disk; they only shape the effective
/// configuration of the current invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Value of `EDGECTL_API_TOKEN`.
    pub api_token: Option<String>,
    /// Value of `EDGECTL_API_ENDPOINT`.
    pub api_endpoint: Option<String>,
}

impl Environment {
    /// Read the overrides from the current process environment.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Read the overrides from an explicit set of variables. Empty values are ignored.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let vars: HashMap<String, String> =
            vars.into_iter().filter(|(_, value)| !value.trim().is_empty()).collect();

        Self {
            api_token: vars.get(API_TOKEN_ENV).cloned(),
            api_endpoint: vars.get(API_ENDPOINT_ENV).cloned(),
        }
    }
}
