//! Pick the merge commits that landed on a release branch
//!
//! A commit is selected when:
//! 1. it is reachable from the branch tip
//! 2. it has more than one parent
//! 3. its message contains the host's merge marker for the branch
//!    (`into 'release'` by default)
//! 4. its author time is at or after the start commit's author time
//!
//! The start commit is looked up in the whole repository, so it does not
//! need to be a merge commit itself.

use crate::core::config::BRANCH_PLACEHOLDER;
use crate::core::error::NotesResult;
use crate::core::vcs::{CommitInfo, SystemGit};
use tracing::debug;

/// Outcome of a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
  /// Qualifying commits, author time ascending (possibly empty)
  Commits(Vec<CommitInfo>),
  /// Neither a local nor a remote-tracking branch with this name exists
  BranchNotFound { branch: String },
  /// The configured start commit is not in the repository
  StartCommitNotFound { sha: String },
}

/// Selects integration commits from a branch history
pub struct CommitSelector {
  remote: String,
  merge_marker_template: String,
}

impl CommitSelector {
  /// `merge_marker_template` contains `{branch}`, e.g. `into '{branch}'`
  pub fn new(remote: impl Into<String>, merge_marker_template: impl Into<String>) -> Self {
    Self {
      remote: remote.into(),
      merge_marker_template: merge_marker_template.into(),
    }
  }

  fn merge_marker(&self, branch: &str) -> String {
    self.merge_marker_template.replace(BRANCH_PLACEHOLDER, branch)
  }

  /// Select merge commits into `branch` authored at or after `start_sha`
  pub fn select(&self, git: &SystemGit, branch: &str, start_sha: &str) -> NotesResult<Selection> {
    let Some(tip) = self.locate_branch(git, branch)? else {
      return Ok(Selection::BranchNotFound {
        branch: branch.to_string(),
      });
    };

    let Some(start) = git.find_commit(start_sha)? else {
      return Ok(Selection::StartCommitNotFound {
        sha: start_sha.to_string(),
      });
    };

    let history = git.commits_reachable_from(&tip)?;
    let selected = self.filter(history, branch, &start);
    debug!(
      branch,
      start = %start.sha,
      selected = selected.len(),
      "selected merge commits"
    );

    Ok(Selection::Commits(selected))
  }

  /// Keep qualifying merges, ordered by author time (stable for ties)
  pub fn filter(&self, history: Vec<CommitInfo>, branch: &str, start: &CommitInfo) -> Vec<CommitInfo> {
    let marker = self.merge_marker(branch);
    let start_time = start.author_timestamp();

    let mut selected: Vec<CommitInfo> = history
      .into_iter()
      .filter(|c| c.is_merge())
      .filter(|c| c.message.contains(&marker))
      .filter(|c| c.author_timestamp() >= start_time)
      .collect();

    // History arrives newest first; oldest first keeps discovery order chronological
    selected.reverse();
    selected.sort_by_key(|c| c.author_timestamp());
    selected
  }

  /// Local branch first, then the remote-tracking branch
  fn locate_branch(&self, git: &SystemGit, branch: &str) -> NotesResult<Option<String>> {
    let local = format!("refs/heads/{}", branch);
    if git.resolve_ref(&local)?.is_some() {
      return Ok(Some(local));
    }

    let remote = format!("refs/remotes/{}/{}", self.remote, branch);
    if git.resolve_ref(&remote)?.is_some() {
      return Ok(Some(remote));
    }

    Ok(None)
  }
}
