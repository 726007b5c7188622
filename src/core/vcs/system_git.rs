//! System git backend
//!
//! Every operation is a `git` subprocess with an isolated environment:
//! - only PATH and HOME are inherited
//! - terminal prompts are disabled so a bad credential fails instead of hanging
//! - credentials travel as `http.extraHeader` through `GIT_CONFIG_*`
//!   variables, never on the command line

use crate::core::credentials::Credentials;
use crate::core::error::{GitError, NotesError, NotesResult, ResultExt};
use crate::utils::is_local_path;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,

  /// `Authorization` header for HTTP remotes
  auth_header: Option<String>,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> NotesResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") || !path.exists() {
        return Err(NotesError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(NotesError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = PathBuf::from(stdout.trim());

    // A plain directory nested inside some other checkout is not a clone of ours
    let same_root = match (path.canonicalize(), work_tree.canonicalize()) {
      (Ok(requested), Ok(root)) => requested == root,
      _ => false,
    };
    if !same_root {
      return Err(NotesError::Git(GitError::RepoNotFound {
        path: path.to_path_buf(),
      }));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree,
      auth_header: None,
    })
  }

  /// Clone `url` into `path`, checking out `branch`
  ///
  /// `path` may exist but must be empty.
  pub fn clone_branch(url: &str, path: &Path, branch: &str, credentials: &Credentials) -> NotesResult<Self> {
    let auth_header = auth_header_for(url, credentials);

    let mut cmd = base_cmd(auth_header.as_deref());
    cmd
      .args(["clone", "--branch", branch, "--", url])
      .arg(path);

    let output = cmd.output().context("Failed to execute git clone")?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).to_string();
      let repository = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| url.to_string());
      return Err(NotesError::Git(classify_failure(&repository, branch, &stderr).unwrap_or(
        GitError::CloneFailed {
          url: url.to_string(),
          reason: stderr.trim().to_string(),
        },
      )));
    }

    let mut git = Self::open(path)?;
    git.auth_header = auth_header;
    Ok(git)
  }

  /// Attach credentials used by network operations on `url`
  pub fn with_credentials(mut self, url: &str, credentials: &Credentials) -> Self {
    self.auth_header = auth_header_for(url, credentials);
    self
  }

  /// Working tree root as reported by git
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Location of the `.git` directory
  pub fn git_dir(&self) -> PathBuf {
    self.work_tree.join(".git")
  }

  /// Get current branch name
  pub fn current_branch(&self) -> NotesResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "--abbrev-ref", "HEAD"])
      .output()
      .context("Failed to get current branch")?;

    if !output.status.success() {
      return Ok("HEAD".to_string()); // Detached HEAD
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Create a safe git command with isolated environment
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = base_cmd(self.auth_header.as_deref());
    cmd.arg("-C").arg(&self.repo_path);
    cmd
  }

  /// Run a git command, turning a non-zero exit into `CommandFailed`
  pub(crate) fn run(&self, args: &[&str]) -> NotesResult<Output> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      return Err(NotesError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(output)
  }
}

fn base_cmd(auth_header: Option<&str>) -> Command {
  let mut cmd = Command::new("git");

  // Isolated environment (don't trust global config)
  cmd.env_clear();
  if let Ok(path) = std::env::var("PATH") {
    cmd.env("PATH", path);
  }
  if let Ok(home) = std::env::var("HOME") {
    cmd.env("HOME", home);
  }
  cmd.env("GIT_TERMINAL_PROMPT", "0");

  if let Some(header) = auth_header {
    cmd.env("GIT_CONFIG_COUNT", "1");
    cmd.env("GIT_CONFIG_KEY_0", "http.extraHeader");
    cmd.env("GIT_CONFIG_VALUE_0", format!("Authorization: {}", header));
  }

  // Force safe behavior (override user config)
  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false");
  cmd.arg("-c").arg("credential.helper=");

  cmd
}

/// Local remotes get no header; an empty secret sends none either
fn auth_header_for(url: &str, credentials: &Credentials) -> Option<String> {
  if is_local_path(url) || url.starts_with("file://") || !credentials.has_secret() {
    return None;
  }
  Some(credentials.basic_auth_header())
}

/// Recognize the failures callers treat differently from a generic error
pub(crate) fn classify_failure(repository: &str, branch: &str, stderr: &str) -> Option<GitError> {
  let lower = stderr.to_lowercase();

  if lower.contains("authentication failed")
    || lower.contains("could not read username")
    || lower.contains("could not read password")
    || lower.contains("terminal prompts disabled")
    || lower.contains("the requested url returned error: 401")
    || lower.contains("the requested url returned error: 403")
  {
    return Some(GitError::AuthenticationFailed {
      repository: repository.to_string(),
      details: stderr.trim().to_string(),
    });
  }

  if lower.contains("remote branch") && lower.contains("not found") {
    return Some(GitError::RemoteBranchNotFound {
      repository: repository.to_string(),
      branch: branch.to_string(),
    });
  }

  if lower.contains("conflict") || lower.contains("automatic merge failed") {
    return Some(GitError::MergeConflict {
      repository: repository.to_string(),
      branch: branch.to_string(),
      details: stderr.trim().to_string(),
    });
  }

  None
}
