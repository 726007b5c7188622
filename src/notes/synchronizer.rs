//! Bring local clones up to date with a remote branch
//!
//! ```text
//! clone_root/<name> missing  -> mkdir, clone --branch <branch>
//! clone_root/<name> present  -> fetch --prune, ensure local tracking branch,
//!                               checkout, merge <remote>/<branch>
//! ```
//!
//! The returned [`WorkingCopy`] holds an exclusive lock on the clone until it
//! is dropped.

use crate::core::credentials::Credentials;
use crate::core::error::{GitError, NotesError, NotesResult, ResultExt};
use crate::core::vcs::SystemGit;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LOCK_FILE_NAME: &str = "relnotes.lock";

/// What a synchronization needs to know about one repository
#[derive(Debug, Clone)]
pub struct SyncRequest<'a> {
  pub name: &'a str,
  pub branch: &'a str,
  pub local_path: &'a Path,
  pub remote_url: &'a str,
}

/// An acquired, synchronized local clone
///
/// Dropping the handle releases the lock, on every exit path.
pub struct WorkingCopy {
  name: String,
  git: SystemGit,
  lock: Option<File>,
  lock_path: PathBuf,
}

impl WorkingCopy {
  /// Take the exclusive lock on an opened repository
  fn acquire(name: &str, git: SystemGit) -> NotesResult<Self> {
    let lock_path = git.git_dir().join(LOCK_FILE_NAME);
    let lock = OpenOptions::new()
      .create(true)
      .write(true)
      .truncate(false)
      .open(&lock_path)
      .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

    if lock.try_lock_exclusive().is_err() {
      return Err(NotesError::Git(GitError::WorkingCopyBusy {
        path: git.work_tree().to_path_buf(),
      }));
    }

    debug!(repository = name, path = %git.work_tree().display(), "working copy acquired");
    Ok(Self {
      name: name.to_string(),
      git,
      lock: Some(lock),
      lock_path,
    })
  }

  pub fn git(&self) -> &SystemGit {
    &self.git
  }
}

impl Drop for WorkingCopy {
  fn drop(&mut self) {
    if let Some(lock) = self.lock.take() {
      let _ = FileExt::unlock(&lock);
      drop(lock);
      let _ = fs::remove_file(&self.lock_path);
    }
    debug!(repository = %self.name, "working copy released");
  }
}

/// Clones or updates repositories
pub struct RepositorySynchronizer<'a> {
  credentials: &'a Credentials,
  remote: String,
}

impl<'a> RepositorySynchronizer<'a> {
  pub fn new(credentials: &'a Credentials, remote: impl Into<String>) -> Self {
    Self {
      credentials,
      remote: remote.into(),
    }
  }

  /// Return a working copy whose `branch` matches the remote's latest state
  pub fn synchronize(&self, request: &SyncRequest<'_>) -> NotesResult<WorkingCopy> {
    if request.local_path.exists() {
      self.update(request)
    } else {
      self.clone_fresh(request)
    }
  }

  fn clone_fresh(&self, request: &SyncRequest<'_>) -> NotesResult<WorkingCopy> {
    info!(repository = request.name, branch = request.branch, "cloning repository");

    fs::create_dir_all(request.local_path)
      .with_context(|| format!("Failed to create clone directory {}", request.local_path.display()))?;

    // Remove the half-created clone unless we get all the way through
    let cleanup = scopeguard::guard(request.local_path.to_path_buf(), |path| {
      let _ = fs::remove_dir_all(&path);
    });

    let git = SystemGit::clone_branch(request.remote_url, request.local_path, request.branch, self.credentials)?;
    let working_copy = WorkingCopy::acquire(request.name, git)?;

    scopeguard::ScopeGuard::into_inner(cleanup);
    info!(repository = request.name, branch = request.branch, "clone done");
    Ok(working_copy)
  }

  fn update(&self, request: &SyncRequest<'_>) -> NotesResult<WorkingCopy> {
    let git = SystemGit::open(request.local_path)?.with_credentials(request.remote_url, self.credentials);
    let working_copy = WorkingCopy::acquire(request.name, git)?;
    let git = working_copy.git();

    info!(repository = request.name, remote = %self.remote, "fetching");
    git.fetch(request.name, &self.remote, request.branch)?;

    let remote_branch = format!("{}/{}", self.remote, request.branch);
    let branches = git.list_branches()?;
    if !branches.iter().any(|b| b.is_remote && b.name == remote_branch) {
      return Err(NotesError::Git(GitError::RemoteBranchNotFound {
        repository: request.name.to_string(),
        branch: request.branch.to_string(),
      }));
    }

    let local_exists = branches.iter().any(|b| !b.is_remote && b.name == request.branch);
    if !local_exists {
      debug!(repository = request.name, branch = request.branch, "creating tracking branch");
      git.create_tracking_branch(request.branch, &self.remote)?;
    }

    if git.current_branch()? != request.branch {
      info!(repository = request.name, branch = request.branch, "checking out branch");
      git.checkout_branch(request.branch)?;
    }

    if git.upstream_of(request.branch)?.as_deref() != Some(remote_branch.as_str()) {
      git.set_upstream(request.branch, &self.remote)?;
    }

    info!(repository = request.name, branch = request.branch, "merging latest commits");
    git.merge_upstream(request.name, request.branch, &self.remote, &self.credentials.username)?;

    Ok(working_copy)
  }
}
