pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use chrono::{DateTime, FixedOffset};

/// Information about a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
  pub sha: String,
  pub author_time: DateTime<FixedOffset>,
  pub parent_shas: Vec<String>,
  pub message: String,
}

impl CommitInfo {
  /// More than one parent
  pub fn is_merge(&self) -> bool {
    self.parent_shas.len() > 1
  }

  /// Author time as seconds since the epoch
  pub fn author_timestamp(&self) -> i64 {
    self.author_time.timestamp()
  }

  /// First line of the message
  pub fn subject(&self) -> &str {
    self.message.lines().next().unwrap_or("")
  }
}

/// A local or remote-tracking branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
  /// Short name: `release` or `origin/release`
  pub name: String,
  pub is_remote: bool,
}
