// src/progress.rs
//! Fetch progress spinner using indicatif

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Spinner shown on stderr while lookups are in flight
#[derive(Clone)]
pub struct ProgressIndicator {
    spinner: Option<ProgressBar>,
    total: usize,
    finished: Arc<AtomicUsize>,
}

impl ProgressIndicator {
    /// Create a progress indicator for `total` concurrent lookups
    pub fn new(enabled: bool, total: usize) -> Self {
        let spinner = if enabled {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
                spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            spinner.enable_steady_tick(Duration::from_millis(100));
            Some(spinner)
        } else {
            None
        };

        let progress = Self {
            spinner,
            total,
            finished: Arc::new(AtomicUsize::new(0)),
        };
        progress.refresh("Querying CT logs");
        progress
    }

    /// Record that one lookup has finished
    pub fn lookup_done(&self, domain: &str) {
        let done = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        self.refresh(&format!("Finished {}", domain));
        if done >= self.total {
            self.finish();
        }
    }

    /// Number of lookups finished so far
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Relaxed)
    }

    fn refresh(&self, what: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(format!("{} ({}/{} domains)", what, self.finished(), self.total));
        }
    }

    /// Finish and clear the progress indicator
    pub fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }

    /// Check if progress indicator is enabled
    pub fn is_enabled(&self) -> bool {
        self.spinner.is_some()
    }
}
