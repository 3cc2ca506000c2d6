//! Spinner shown while a self-update is in progress.

use std::time::Duration;

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Environment variable that hides progress indicators.
pub const NO_PROGRESS_ENV: &str = "EDGECTL_NO_PROGRESS";

/// An indeterminate progress indicator on stderr.
///
/// The spinner is hidden in quiet mode, when stderr is not a terminal, and
/// when `EDGECTL_NO_PROGRESS` is set.
pub struct Spinner {
    inner: IndicatifBar,
}

impl Spinner {
    /// Start a spinner with an initial message.
    pub fn start(message: impl Into<String>, quiet: bool) -> Self {
        let inner = if quiet || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        inner.set_message(message.into());
        Self {
            inner,
        }
    }

    /// Stop and erase the spinner.
    pub fn finish(&self) {
        self.inner.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.inner.is_finished() {
            self.inner.finish_and_clear();
        }
    }
}

fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}
