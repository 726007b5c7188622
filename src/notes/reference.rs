//! Issue references in commit messages (`#1234`)

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static ISSUE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([0-9]+)").expect("valid issue reference pattern"));

/// Tracker issue identifier as written in the commit message (digits only)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueId(String);

impl IssueId {
  /// Wrap a digit run; anything else is rejected
  pub fn new(raw: impl Into<String>) -> Option<Self> {
    let raw = raw.into();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    Some(Self(raw))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Same issue regardless of leading zeros (`#007` and `#7`)
  pub fn matches(&self, other: &IssueId) -> bool {
    self.0.trim_start_matches('0') == other.0.trim_start_matches('0')
  }
}

impl fmt::Display for IssueId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u64> for IssueId {
  fn from(id: u64) -> Self {
    Self(id.to_string())
  }
}

/// First `#<digits>` in the message, if any
///
/// Later references in the same message are ignored.
pub fn extract_issue_reference(message: &str) -> Option<IssueId> {
  ISSUE_REFERENCE
    .captures(message)
    .and_then(|caps| caps.get(1))
    .and_then(|m| IssueId::new(m.as_str()))
}
