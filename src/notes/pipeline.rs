//! The commit-to-issue correlation run
//!
//! For each target, in configured order:
//!
//! ```text
//! synchronize -> select merges -> (per commit) extract #id -> resolve -> assemble
//! ```
//!
//! Repository-level failures (sync errors, missing branch, missing start
//! commit) skip that repository and the run continues. Commit-level problems
//! (no reference, unresolved issue) skip the commit. The working copy is
//! released as soon as its commits have been read.

use crate::core::config::{GitConfig, RepositoryTarget};
use crate::core::credentials::Credentials;
use crate::core::error::GitError;
use crate::core::vcs::CommitInfo;
use crate::notes::assembler::{ReleaseNoteAssembler, ReleaseNoteDocument};
use crate::notes::reference::{IssueId, extract_issue_reference};
use crate::notes::selector::{CommitSelector, Selection};
use crate::notes::synchronizer::{RepositorySynchronizer, SyncRequest};
use crate::notes::tracker::{IssueResolver, IssueTracker, Resolution};
use crate::ui::progress::CommitProgress;
use tracing::{debug, error, info, warn};

/// What happened to one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryStatus {
  Completed {
    /// Merge commits that passed selection
    selected_commits: usize,
    /// Issues added to the document
    issues: usize,
    /// Selected commits without an issue reference
    unreferenced_commits: usize,
    /// Identifiers the tracker could not resolve
    unresolved: Vec<IssueId>,
  },
  Skipped {
    reason: String,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOutcome {
  pub name: String,
  pub status: RepositoryStatus,
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct RunReport {
  pub document: ReleaseNoteDocument,
  pub outcomes: Vec<RepositoryOutcome>,
}

impl RunReport {
  pub fn skipped(&self) -> impl Iterator<Item = &RepositoryOutcome> {
    self
      .outcomes
      .iter()
      .filter(|o| matches!(o.status, RepositoryStatus::Skipped { .. }))
  }

  pub fn unresolved_count(&self) -> usize {
    self
      .outcomes
      .iter()
      .map(|o| match &o.status {
        RepositoryStatus::Completed { unresolved, .. } => unresolved.len(),
        RepositoryStatus::Skipped { .. } => 0,
      })
      .sum()
  }

  /// At least one repository skipped or one issue unresolved
  pub fn is_partial(&self) -> bool {
    self.skipped().next().is_some() || self.unresolved_count() > 0
  }
}

/// Runs the pipeline over a list of targets
pub struct Generator<'a, T: IssueTracker> {
  git: &'a GitConfig,
  synchronizer: RepositorySynchronizer<'a>,
  selector: CommitSelector,
  resolver: IssueResolver<T>,
  show_progress: bool,
}

impl<'a, T: IssueTracker> Generator<'a, T> {
  pub fn new(git: &'a GitConfig, credentials: &'a Credentials, tracker: T) -> Self {
    Self {
      git,
      synchronizer: RepositorySynchronizer::new(credentials, git.remote.clone()),
      selector: CommitSelector::new(git.remote.clone(), git.merge_marker.clone()),
      resolver: IssueResolver::new(tracker),
      show_progress: false,
    }
  }

  /// Draw a progress bar per repository (interactive stderr only)
  pub fn with_progress(mut self, enabled: bool) -> Self {
    self.show_progress = enabled;
    self
  }

  /// Process every target and build the document
  pub fn run(mut self, targets: &[RepositoryTarget]) -> RunReport {
    let mut assembler = ReleaseNoteAssembler::new();
    let mut outcomes = Vec::with_capacity(targets.len());

    for target in targets {
      println!("\n📦 {} ({})", target.name, target.branch);
      let status = self.process(target, &mut assembler);
      if let RepositoryStatus::Skipped { reason } = &status {
        println!("   ⚠️  skipped: {}", reason);
      }
      outcomes.push(RepositoryOutcome {
        name: target.name.clone(),
        status,
      });
    }

    RunReport {
      document: assembler.finalize(),
      outcomes,
    }
  }

  fn process(&mut self, target: &RepositoryTarget, assembler: &mut ReleaseNoteAssembler) -> RepositoryStatus {
    let commits = match self.mine(target) {
      Ok(commits) => commits,
      Err(reason) => {
        error!(repository = %target.name, %reason, "repository skipped");
        return RepositoryStatus::Skipped { reason };
      }
    };

    assembler.begin_repository(target);

    let mut progress = if self.show_progress {
      CommitProgress::new(commits.len(), format!("Resolving {} commits", commits.len()))
    } else {
      CommitProgress::hidden()
    };

    let mut issues = 0;
    let mut unreferenced_commits = 0;
    let mut unresolved: Vec<IssueId> = Vec::new();

    for commit in &commits {
      match self.correlate(target, commit, assembler) {
        CommitOutcome::Added => issues += 1,
        CommitOutcome::Duplicate => {}
        CommitOutcome::Unreferenced => unreferenced_commits += 1,
        CommitOutcome::Unresolved(id) => {
          if !unresolved.iter().any(|known| known.matches(&id)) {
            unresolved.push(id);
          }
        }
      }
      progress.inc();
    }

    info!(
      repository = %target.name,
      commits = commits.len(),
      issues,
      unresolved = unresolved.len(),
      "repository processed"
    );

    RepositoryStatus::Completed {
      selected_commits: commits.len(),
      issues,
      unreferenced_commits,
      unresolved,
    }
  }

  /// Synchronize and select; the working copy is released on return
  fn mine(&self, target: &RepositoryTarget) -> Result<Vec<CommitInfo>, String> {
    let remote_url = self.git.remote_url(&target.name);
    let local_path = self.git.local_path(&target.name);

    let working_copy = self
      .synchronizer
      .synchronize(&SyncRequest {
        name: &target.name,
        branch: &target.branch,
        local_path: &local_path,
        remote_url: &remote_url,
      })
      .map_err(|e| e.to_string())?;

    let selection = self
      .selector
      .select(working_copy.git(), &target.branch, &target.start_commit)
      .map_err(|e| e.to_string())?;

    match selection {
      Selection::Commits(commits) => Ok(commits),
      Selection::BranchNotFound { branch } => Err(GitError::BranchNotFound { branch }.to_string()),
      Selection::StartCommitNotFound { sha } => Err(GitError::CommitNotFound { sha }.to_string()),
    }
  }

  fn correlate(
    &mut self,
    target: &RepositoryTarget,
    commit: &CommitInfo,
    assembler: &mut ReleaseNoteAssembler,
  ) -> CommitOutcome {
    let Some(id) = extract_issue_reference(&commit.message) else {
      warn!(
        repository = %target.name,
        commit = %short_sha(&commit.sha),
        subject = %commit.subject(),
        "merge commit has no issue reference, skipped"
      );
      return CommitOutcome::Unreferenced;
    };

    if assembler.contains(&target.name, &id) {
      debug!(repository = %target.name, issue = %id, "issue already listed");
      return CommitOutcome::Duplicate;
    }

    match self.resolver.resolve(&id) {
      Resolution::Found(issue) => {
        println!(
          "- {}| {}",
          commit.author_time.format("%Y-%m-%d %H:%M:%S %:z"),
          issue.summary()
        );
        assembler.add(&target.name, issue);
        CommitOutcome::Added
      }
      Resolution::NotFound => {
        error!(
          repository = %target.name,
          issue = %id,
          commit = %short_sha(&commit.sha),
          "issue not found in open or closed issues"
        );
        CommitOutcome::Unresolved(id)
      }
      Resolution::Unavailable { reason } => {
        error!(
          repository = %target.name,
          issue = %id,
          commit = %short_sha(&commit.sha),
          %reason,
          "issue could not be resolved"
        );
        CommitOutcome::Unresolved(id)
      }
    }
  }
}

enum CommitOutcome {
  Added,
  Duplicate,
  Unreferenced,
  Unresolved(IssueId),
}

fn short_sha(sha: &str) -> &str {
  sha.get(..8).unwrap_or(sha)
}
