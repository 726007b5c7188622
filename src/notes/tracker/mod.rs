//! Issue tracker access
//!
//! - **IssueTracker**: capability trait, one query per status partition
//! - **RedmineTracker**: REST implementation over `reqwest::blocking`
//! - **IssueResolver**: open-then-closed lookup with graceful degradation

pub mod redmine;
pub mod resolver;

pub use redmine::RedmineTracker;
pub use resolver::{IssueResolver, Resolution};

use crate::core::error::TrackerError;
use crate::notes::reference::IssueId;
use std::fmt;

/// Status partition of the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueScope {
  Open,
  Closed,
}

impl fmt::Display for IssueScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      IssueScope::Open => write!(f, "open"),
      IssueScope::Closed => write!(f, "closed"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
  Open,
  Closed,
}

/// A resolved tracker record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
  pub id: IssueId,
  /// Tracker / category name ("Bug", "Feature", ...)
  pub tracker: String,
  pub subject: String,
  pub status: IssueStatus,
}

impl Issue {
  /// `<tracker> #<id>: <subject>`
  pub fn summary(&self) -> String {
    format!("{} #{}: {}", self.tracker, self.id, self.subject)
  }
}

/// Query interface of an issue tracker
pub trait IssueTracker {
  /// Zero or one issue with this identifier in the given partition
  fn find_issue(&self, id: &IssueId, scope: IssueScope) -> Result<Option<Issue>, TrackerError>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for &T {
  fn find_issue(&self, id: &IssueId, scope: IssueScope) -> Result<Option<Issue>, TrackerError> {
    (**self).find_issue(id, scope)
  }
}
