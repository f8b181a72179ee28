//! CLI-specific progress handling for railnav
//!
//! A spinner while the backend works and a bar that fills hop by hop
//! during the highlight animation.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use railnav::AnimatorEvent;

/// Creates a progress bar counting highlighted hops
pub fn create_progress_bar(total_hops: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_hops);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} hops {msg}")
            .expect("Failed to create progress style")
            .progress_chars("#>-"),
    );
    pb
}

/// Creates a spinner for a pending backend request
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .expect("Failed to create spinner style"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress display for one highlight animation
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_hops: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_hops);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb }
    }

    /// Reflect one animator event on the bar
    pub fn record(&self, event: &AnimatorEvent) {
        match event {
            AnimatorEvent::Highlighted { step, hop, .. } => {
                self.pb.set_position(*step as u64 + 1);
                self.pb.set_message(hop.to_string());
            }
            AnimatorEvent::Completed => self.pb.finish_with_message("✅ Highlight complete"),
            AnimatorEvent::Failed { error } => self.pb.abandon_with_message(format!("❌ {error}")),
        }
    }
}
