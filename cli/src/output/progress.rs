//! Progress indicators using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for indeterminate progress.
///
/// # Panics
///
/// Panics if the spinner template string is invalid (it is a compile-time constant and will not panic).
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "→"])
            .template("  {spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Freeze a spinner in place with `prefix` on the left.
fn finish_with_prefix(pb: &ProgressBar, prefix: &'static str, msg: &str) {
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {prefix} {msg}")
            .expect("valid template"),
    );
    pb.set_prefix(prefix);
    pb.finish_with_message(msg.to_string());
}

/// Finish a spinner with a checkmark on the left.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    finish_with_prefix(pb, "✓", msg);
}

/// Finish a spinner as a completed step, keeping its message.
pub fn finish_step(pb: &ProgressBar) {
    let msg = pb.message();
    finish_with_prefix(pb, "→", &msg);
}

/// Finish a spinner with a warning marker.
pub fn finish_warn(pb: &ProgressBar, msg: &str) {
    finish_with_prefix(pb, "!", msg);
}
