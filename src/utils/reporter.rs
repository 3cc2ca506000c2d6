//! User-facing output gated by `--verbose` and `--quiet`.

use colored::Colorize;

use crate::core::ErrorContext;

/// Prints progress and status text for the user.
///
/// Informational lifecycle messages only appear with `--verbose`. Regular
/// status lines are suppressed by `--quiet`. Warnings always go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbose: bool,
    quiet: bool,
}

impl Reporter {
    /// Create a reporter for the given output flags.
    pub const fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet: quiet && !verbose,
        }
    }

    /// A reporter that prints nothing but warnings.
    pub const fn silent() -> Self {
        Self::new(false, true)
    }

    /// Whether `--verbose` is active.
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether `--quiet` is active.
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print an informational message, only in verbose mode.
    pub fn info(&self, message: impl AsRef<str>) {
        if self.verbose {
            println!("{} {}", "info:".cyan().bold(), message.as_ref());
        }
    }

    /// Print a status line unless quiet.
    pub fn status(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }

    /// Print a success line unless quiet.
    pub fn success(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{} {}", "✓".green().bold(), message.as_ref());
        }
    }

    /// Print a warning on stderr, only in verbose mode.
    pub fn verbose_warning(&self, message: impl AsRef<str>) {
        if self.verbose {
            eprintln!("{}: {}", "warning".yellow().bold(), message.as_ref());
        }
    }

    /// Print a non-fatal error as a warning on stderr, regardless of flags.
    pub fn warning(&self, context: &ErrorContext) {
        context.display_as_warning();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_wins_over_quiet() {
        let reporter = Reporter::new(true, true);
        assert!(reporter.is_verbose());
        assert!(!reporter.is_quiet());

        assert!(Reporter::silent().is_quiet());
        assert!(!Reporter::default().is_verbose());
    }
}
