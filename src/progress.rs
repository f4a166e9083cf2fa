use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};

/// Bytes accounted for across every file of one run.
///
/// Shared by all fetch tasks behind an `Arc`; the optional bar only mirrors
/// the counter for the terminal.
#[derive(Default)]
pub struct ProgressCounter {
    bytes: AtomicU64,
    bar: Option<ProgressBar>,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bar(total: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} {bar:40} {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message("Total");
        Self {
            bytes: AtomicU64::new(0),
            bar: Some(bar),
        }
    }

    pub fn add(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(n);
        }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message("Complete");
        }
    }
}
