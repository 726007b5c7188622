//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars drawn on stderr

use linya::{Bar, Progress};
use std::io::IsTerminal;

/// Progress bar for processing a repository's commits
///
/// Draws nothing when stderr is not a terminal, so piped and logged runs
/// stay clean.
pub struct CommitProgress {
  inner: Option<(Progress, Bar)>,
}

impl CommitProgress {
  /// Create a progress bar if stderr is interactive
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    if total == 0 || !std::io::stderr().is_terminal() {
      return Self::hidden();
    }

    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      inner: Some((progress, bar)),
    }
  }

  /// A progress bar that never draws
  pub fn hidden() -> Self {
    Self { inner: None }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    if let Some((progress, bar)) = self.inner.as_mut() {
      progress.inc_and_draw(bar, 1);
    }
  }
}
