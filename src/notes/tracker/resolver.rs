use super::{Issue, IssueScope, IssueTracker};
use crate::notes::reference::IssueId;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of resolving one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  Found(Issue),
  /// Neither partition knows the identifier
  NotFound,
  /// No partition matched and at least one query failed
  Unavailable { reason: String },
}

/// Resolves identifiers against the open partition, then the closed one
///
/// Outcomes are cached for the lifetime of the resolver, except lookups
/// degraded by a failing query, which are retried on the next request.
pub struct IssueResolver<T: IssueTracker> {
  tracker: T,
  cache: HashMap<IssueId, Option<Issue>>,
}

impl<T: IssueTracker> IssueResolver<T> {
  pub fn new(tracker: T) -> Self {
    Self {
      tracker,
      cache: HashMap::new(),
    }
  }

  pub fn resolve(&mut self, id: &IssueId) -> Resolution {
    if let Some(cached) = self.cache.get(id) {
      debug!(issue = %id, "issue resolved from cache");
      return match cached {
        Some(issue) => Resolution::Found(issue.clone()),
        None => Resolution::NotFound,
      };
    }

    let mut failures = Vec::new();
    for scope in [IssueScope::Open, IssueScope::Closed] {
      match self.tracker.find_issue(id, scope) {
        Ok(Some(issue)) => {
          debug!(issue = %id, %scope, "issue found");
          self.cache.insert(id.clone(), Some(issue.clone()));
          return Resolution::Found(issue);
        }
        Ok(None) => {}
        Err(err) => {
          warn!(issue = %id, %scope, error = %err, "tracker query failed, treating as no result");
          failures.push(format!("{} query: {}", scope, err));
        }
      }
    }

    if failures.is_empty() {
      self.cache.insert(id.clone(), None);
      Resolution::NotFound
    } else {
      Resolution::Unavailable {
        reason: failures.join("; "),
      }
    }
  }
}
