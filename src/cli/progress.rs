//! CLI-specific progress handling for quality-unwrap
//!
//! Provides a progress bar that receives the engine's per-sample signals.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use quality_unwrap::Progress;

/// Samples between redraw checks; the engine signals once per sample
const TICK_BATCH: u64 = 4096;

/// Creates a progress bar for CLI display
pub fn create_progress_bar(total_samples: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_samples);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
                 {pos}/{len} samples ({percent}%) {per_sec} ETA: {eta}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Progress manager for an unwrapping run
pub struct ProgressManager {
    pub pb: ProgressBar,
    pending: u64,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_samples: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_samples);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb, pending: 0 }
    }

    /// Manager whose bar never draws, for `--no-progress` and tests
    pub fn hidden(total_samples: u64) -> Self {
        let pb = ProgressBar::with_draw_target(Some(total_samples), ProgressDrawTarget::hidden());
        Self { pb, pending: 0 }
    }

    /// Flush batched ticks and close the bar
    ///
    /// A partial run leaves the bar at the number of samples actually
    /// resolved instead of filling it.
    pub fn finish(&mut self, message: String, complete: bool) {
        self.flush();
        if complete {
            self.pb.finish_with_message(message);
        } else {
            self.pb.abandon_with_message(message);
        }
    }

    fn flush(&mut self) {
        if self.pending > 0 {
            self.pb.inc(self.pending);
            self.pending = 0;
        }
    }
}

impl Progress for ProgressManager {
    fn on_unit_complete(&mut self) {
        self.pending += 1;
        if self.pending >= TICK_BATCH {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar_template() {
        let pb = create_progress_bar(1000);

        assert_eq!(pb.length().unwrap(), 1000);

        // Template string must be valid for the bar to draw
        pb.set_position(100);
        pb.finish();
    }

    #[test]
    fn test_progress_manager_batches_ticks() {
        let mut manager = ProgressManager::hidden(10_000);
        for _ in 0..(TICK_BATCH + 10) {
            manager.on_unit_complete();
        }
        assert_eq!(manager.pb.position(), TICK_BATCH);
        manager.finish("partial".to_string(), false);
        assert_eq!(manager.pb.position(), TICK_BATCH + 10);
        assert!(manager.pb.is_finished());
    }

    #[test]
    fn test_complete_run_fills_the_bar() {
        let mut manager = ProgressManager::hidden(8);
        for _ in 0..8 {
            manager.on_unit_complete();
        }
        manager.finish("done".to_string(), true);
        assert_eq!(manager.pb.position(), 8);
        assert!(manager.pb.is_finished());
    }
}
