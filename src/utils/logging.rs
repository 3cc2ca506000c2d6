//! Process-wide tracing setup.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence. Otherwise edgectl logs at `debug` with
/// `--verbose` (dependencies stay at `warn`), `error` with `--quiet` and
/// `warn` by default. Calling this
/// more than once is harmless.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_level(verbose, quiet))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();
}

fn default_level(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "warn,edgectl=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}
