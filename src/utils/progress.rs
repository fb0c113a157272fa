//! Fetch spinner built on indicatif.
//!
//! Shows how many directory objects have been retrieved while the paginated
//! walk is in flight. Draws to stderr so stdout stays clean for reports.

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner with a running object count.
pub struct FetchSpinner {
    bar: ProgressBar,
}

impl FetchSpinner {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner} {pos} objects")
                .expect("Invalid spinner template"),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        Self { bar }
    }

    /// Spinner that never draws, for non-interactive runs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Add a page worth of objects to the running count
    pub fn add(&self, objects: usize) {
        self.bar.inc(objects as u64);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_spinner_counts_objects() {
        let spinner = FetchSpinner::hidden();
        spinner.add(100);
        spinner.add(42);
        assert_eq!(spinner.position(), 142);
        spinner.finish_and_clear();
    }
}
