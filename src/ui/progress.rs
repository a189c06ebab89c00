//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars drawn on stderr, so stdout
//! stays clean for status lines and JSON reports.

use linya::{Bar, Progress};

/// One bar counting finished build targets
pub struct BuildProgress {
  progress: Progress,
  bar: Bar,
}

impl BuildProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Set progress to a specific value
  pub fn set(&mut self, pos: usize) {
    self.progress.set_and_draw(&self.bar, pos);
  }
}
