//! Additional operations for SystemGit (branches, fetch/merge, commit walking)

use super::system_git::{SystemGit, classify_failure};
use super::{BranchRef, CommitInfo};
use crate::core::error::{GitError, NotesError, NotesResult, ResultExt};
use chrono::DateTime;
use std::path::Path;
use tracing::warn;

/// hash, strict ISO author date, parent hashes, raw body; NUL separated
///
/// Used with `-z`, which terminates each record with NUL as well. NUL cannot
/// occur in a commit message, so every record is exactly [`LOG_FIELDS`] tokens.
const LOG_FORMAT: &str = "--format=%H%x00%aI%x00%P%x00%B";
const LOG_FIELDS: usize = 4;

impl SystemGit {
  /// List local branches and remote-tracking branches
  pub fn list_branches(&self) -> NotesResult<Vec<BranchRef>> {
    let output = self.run(&["for-each-ref", "--format=%(refname)", "refs/heads", "refs/remotes"])?;

    let branches = String::from_utf8_lossy(&output.stdout)
      .lines()
      .filter_map(|line| {
        if let Some(name) = line.strip_prefix("refs/heads/") {
          Some(BranchRef {
            name: name.to_string(),
            is_remote: false,
          })
        } else {
          line
            .strip_prefix("refs/remotes/")
            .filter(|name| !name.ends_with("/HEAD"))
            .map(|name| BranchRef {
              name: name.to_string(),
              is_remote: true,
            })
        }
      })
      .collect();

    Ok(branches)
  }

  /// Fetch all configured refspecs and tags of a remote, pruning deleted branches
  pub fn fetch(&self, repository: &str, remote: &str, branch: &str) -> NotesResult<()> {
    let output = self
      .git_cmd()
      .args(["fetch", "--prune", "--tags", remote])
      .output()
      .context("Failed to execute git fetch")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).to_string();
      return Err(NotesError::Git(classify_failure(repository, branch, &stderr).unwrap_or(
        GitError::CommandFailed {
          command: format!("git fetch --prune --tags {}", remote),
          stderr,
        },
      )));
    }

    Ok(())
  }

  /// Create a local branch tracking `<remote>/<branch>`
  pub fn create_tracking_branch(&self, branch: &str, remote: &str) -> NotesResult<()> {
    let upstream = format!("{}/{}", remote, branch);
    self.run(&["branch", "--track", branch, &upstream])?;
    Ok(())
  }

  /// Upstream of a local branch, if any (e.g. `origin/release`)
  pub fn upstream_of(&self, branch: &str) -> NotesResult<Option<String>> {
    let spec = format!("{}@{{upstream}}", branch);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--abbrev-ref", "--symbolic-full-name", &spec])
      .output()
      .context("Failed to query upstream branch")?;

    if !output.status.success() {
      return Ok(None);
    }

    let upstream = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if upstream.is_empty() { None } else { Some(upstream) })
  }

  /// Point an existing local branch at `<remote>/<branch>`
  pub fn set_upstream(&self, branch: &str, remote: &str) -> NotesResult<()> {
    let flag = format!("--set-upstream-to={}/{}", remote, branch);
    self.run(&["branch", &flag, branch])?;
    Ok(())
  }

  /// Checkout a branch
  pub fn checkout_branch(&self, branch: &str) -> NotesResult<()> {
    self.run(&["checkout", branch])?;
    Ok(())
  }

  /// Merge `<remote>/<branch>` into the checked-out branch
  ///
  /// Conflicts abort the merge and leave the working copy as it was. A failed
  /// abort is reported as [`GitError::MergeAbortFailed`].
  pub fn merge_upstream(&self, repository: &str, branch: &str, remote: &str, username: &str) -> NotesResult<()> {
    let upstream = format!("{}/{}", remote, branch);
    let output = self
      .git_cmd()
      .arg("-c")
      .arg(format!("user.name={}", username))
      .arg("-c")
      .arg(format!("user.email={}@localhost", username))
      .args(["merge", "--no-edit", &upstream])
      .output()
      .context("Failed to execute git merge")?;

    if output.status.success() {
      return Ok(());
    }

    // git reports conflicts on stdout
    let details = format!(
      "{}{}",
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );

    let abort_failure = if self.git_dir().join("MERGE_HEAD").exists() {
      self.abort_merge()
    } else {
      None
    };
    if let Some(reason) = &abort_failure {
      warn!(repository, branch, error = %reason, "git merge --abort failed, clone left mid-merge");
    }

    Err(NotesError::Git(merge_failure(
      repository,
      branch,
      self.work_tree(),
      &details,
      abort_failure,
    )))
  }

  /// Run `git merge --abort`, returning the failure reason if it did not succeed
  fn abort_merge(&self) -> Option<String> {
    match self.git_cmd().args(["merge", "--abort"]).output() {
      Ok(output) if output.status.success() => None,
      Ok(output) => Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
      Err(e) => Some(e.to_string()),
    }
  }

  /// Resolve a revision to a full commit SHA
  pub fn resolve_ref(&self, rev: &str) -> NotesResult<Option<String>> {
    let spec = format!("{}^{{commit}}", rev);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &spec])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
  }

  /// All commits reachable from `rev`, newest first
  pub fn commits_reachable_from(&self, rev: &str) -> NotesResult<Vec<CommitInfo>> {
    let output = self.run(&["log", "-z", "--date-order", LOG_FORMAT, rev])?;
    parse_log_output(&output.stdout)
  }

  /// Look up a single commit by (possibly abbreviated) SHA
  pub fn find_commit(&self, sha: &str) -> NotesResult<Option<CommitInfo>> {
    if sha.is_empty() || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
      return Ok(None);
    }

    let Some(full_sha) = self.resolve_ref(sha)? else {
      return Ok(None);
    };

    let output = self.run(&["log", "-z", "-1", LOG_FORMAT, &full_sha])?;
    Ok(parse_log_output(&output.stdout)?.into_iter().next())
  }
}

/// Error for a failed `git merge`, given the outcome of the abort attempt
fn merge_failure(
  repository: &str,
  branch: &str,
  work_tree: &Path,
  details: &str,
  abort_failure: Option<String>,
) -> GitError {
  if let Some(abort) = abort_failure {
    return GitError::MergeAbortFailed {
      repository: repository.to_string(),
      path: work_tree.to_path_buf(),
      details: format!("{}\n{}", details.trim(), abort),
    };
  }

  classify_failure(repository, branch, details).unwrap_or(GitError::MergeConflict {
    repository: repository.to_string(),
    branch: branch.to_string(),
    details: details.trim().to_string(),
  })
}

/// Parse `git log -z` output produced with [`LOG_FORMAT`]
fn parse_log_output(data: &[u8]) -> NotesResult<Vec<CommitInfo>> {
  let output = String::from_utf8_lossy(data);
  let output = output.trim_end_matches('\n');
  let output = output.strip_suffix('\0').unwrap_or(output);
  if output.is_empty() {
    return Ok(Vec::new());
  }

  let tokens: Vec<&str> = output.split('\0').collect();
  if tokens.len() % LOG_FIELDS != 0 {
    return Err(NotesError::message(format!(
      "Unexpected git log output: {} fields is not a multiple of {}",
      tokens.len(),
      LOG_FIELDS
    )));
  }

  tokens.chunks(LOG_FIELDS).map(parse_commit_record).collect()
}

fn parse_commit_record(fields: &[&str]) -> NotesResult<CommitInfo> {
  let sha = fields[0].trim();
  if sha.is_empty() {
    return Err(NotesError::message("Missing commit SHA"));
  }
  let sha = sha.to_string();

  let author_time = DateTime::parse_from_rfc3339(fields[1].trim())
    .with_context(|| format!("Invalid author time for commit {}", sha))?;
  let parent_shas = fields[2].split_whitespace().map(|s| s.to_string()).collect();
  let message = fields[3].trim().to_string();

  Ok(CommitInfo {
    sha,
    author_time,
    parent_shas,
    message,
  })
}
