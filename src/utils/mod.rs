//! Process-level helpers shared by the commands.
//!
//! # Modules
//!
//! - [`http`] - the shared HTTP client (timeout, `User-Agent`)
//! - [`logging`] - tracing subscriber setup
//! - [`progress`] - the update spinner
//! - [`reporter`] - verbose/quiet aware user output

pub mod http;
pub mod logging;
pub mod progress;
pub mod reporter;

pub use http::{http_client, http_timeout};
pub use logging::init_logging;
pub use progress::Spinner;
pub use reporter::Reporter;
