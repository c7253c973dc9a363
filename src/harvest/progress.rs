//! Terminal progress line for harvest runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner showing the page and element being fetched. Hidden when quiet.
#[derive(Debug)]
pub struct HarvestProgress {
    spinner: ProgressBar,
}

impl HarvestProgress {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }

    pub fn page(&self, page: usize, location: &str) {
        self.spinner
            .set_message(format!("[page {page}] Fetching feed {location}..."));
    }

    pub fn element(&self, page: usize, index: usize, total: usize, location: &str) {
        self.spinner.set_message(format!(
            "[page {page}] [{index}/{total}] Fetching {location}..."
        ));
    }

    pub fn compiling(&self, target: &str) {
        self.spinner.set_message(format!("Compiling {target}..."));
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.spinner.is_hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_progress_is_hidden() {
        let progress = HarvestProgress::new(true);
        assert!(progress.is_hidden());
        progress.page(1, "https://example.org/feed");
        progress.finish();
    }

    #[test]
    fn test_messages_do_not_panic_when_visible() {
        let progress = HarvestProgress::new(false);
        progress.element(2, 3, 5, "https://example.org/e/3");
        progress.compiling("cto");
        progress.finish();
    }
}
