//! Error types for relnotes with contextual messages and exit codes
//!
//! Every error belongs to a category (config, git, tracker, I/O) that decides
//! the process exit code. Most categories carry a help hint for the user.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for relnotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Everything was processed
  Success = 0,
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, network, I/O, output write)
  System = 2,
  /// Validation failure (invalid configuration values)
  Validation = 3,
  /// Output written, but some repositories or issues were skipped
  Partial = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for relnotes
#[derive(Debug)]
pub enum NotesError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Issue tracker errors
  Tracker(TrackerError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl NotesError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    NotesError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    NotesError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// I/O errors keep their category (and exit code); the context is
  /// prepended to the underlying message.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      NotesError::Message { message, context, help } => NotesError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      NotesError::Io(err) => NotesError::Io(io::Error::new(err.kind(), format!("{}: {}", ctx_str, err))),
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      NotesError::Config(ConfigError::Invalid { .. }) => ExitCode::Validation,
      NotesError::Config(_) => ExitCode::User,
      NotesError::Git(_) => ExitCode::System,
      NotesError::Tracker(_) => ExitCode::System,
      NotesError::Io(_) => ExitCode::System,
      NotesError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      NotesError::Config(e) => e.help_message(),
      NotesError::Git(e) => e.help_message(),
      NotesError::Tracker(e) => e.help_message(),
      NotesError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for NotesError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NotesError::Config(e) => write!(f, "{}", e),
      NotesError::Git(e) => write!(f, "{}", e),
      NotesError::Tracker(e) => write!(f, "{}", e),
      NotesError::Io(e) => write!(f, "I/O error: {}", e),
      NotesError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for NotesError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      NotesError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for NotesError {
  fn from(err: io::Error) -> Self {
    NotesError::Io(err)
  }
}

impl From<String> for NotesError {
  fn from(msg: String) -> Self {
    NotesError::message(msg)
  }
}

impl From<&str> for NotesError {
  fn from(msg: &str) -> Self {
    NotesError::message(msg)
  }
}

impl From<toml_edit::de::Error> for NotesError {
  fn from(err: toml_edit::de::Error) -> Self {
    NotesError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for NotesError {
  fn from(err: serde_json::Error) -> Self {
    NotesError::message(format!("JSON error: {}", err))
  }
}

impl From<chrono::ParseError> for NotesError {
  fn from(err: chrono::ParseError) -> Self {
    NotesError::message(format!("Timestamp parse error: {}", err))
  }
}

impl From<tempfile::PersistError> for NotesError {
  fn from(err: tempfile::PersistError) -> Self {
    NotesError::Io(err.error)
  }
}

impl From<TrackerError> for NotesError {
  fn from(err: TrackerError) -> Self {
    NotesError::Tracker(err)
  }
}

impl From<GitError> for NotesError {
  fn from(err: GitError) -> Self {
    NotesError::Git(err)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// No config file found in the search locations
  NotFound { search_root: PathBuf },

  /// Missing required field
  MissingField { field: String },

  /// Field present but its value is unusable
  Invalid { field: String, reason: String },

  /// Repository requested on the command line is not configured
  RepositoryNotFound { name: String },

  /// A secret is required but cannot be obtained
  CredentialsUnavailable { reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create relnotes.toml in the current directory or pass --config <path>.".to_string())
      }
      ConfigError::RepositoryNotFound { name } => Some(format!(
        "Run `relnotes config` to list configured repositories. Is '{}' listed under [[git.repositories]]?",
        name
      )),
      ConfigError::CredentialsUnavailable { .. } => Some(
        "Set `git.secret` in the config, export RELNOTES_GIT_SECRET, or run from an interactive terminal.".to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { search_root } => {
        write!(
          f,
          "No relnotes configuration found.\nSearched: {}/relnotes.toml, .relnotes.toml, .config/relnotes.toml",
          search_root.display()
        )
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid value for '{}': {}", field, reason)
      }
      ConfigError::RepositoryNotFound { name } => {
        write!(f, "Repository '{}' not found in configuration", name)
      }
      ConfigError::CredentialsUnavailable { reason } => {
        write!(f, "Git credentials unavailable: {}", reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Target branch has no remote-tracking counterpart
  RemoteBranchNotFound { repository: String, branch: String },

  /// Branch cannot be resolved locally
  BranchNotFound { branch: String },

  /// Commit not found
  CommitNotFound { sha: String },

  /// Local branch cannot be updated without conflicts
  MergeConflict {
    repository: String,
    branch: String,
    details: String,
  },

  /// Conflicting merge could not be rolled back; the clone is mid-merge
  MergeAbortFailed {
    repository: String,
    path: PathBuf,
    details: String,
  },

  /// Remote rejected the credentials
  AuthenticationFailed { repository: String, details: String },

  /// Clone failed for another reason
  CloneFailed { url: String, reason: String },

  /// Another process holds the working copy lock
  WorkingCopyBusy { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::AuthenticationFailed { .. } => {
        Some("Check `git.username` and the password or personal access token.".to_string())
      }
      GitError::RemoteBranchNotFound { branch, .. } => Some(format!(
        "Check the `branch` setting; '{}' must exist on the remote.",
        branch
      )),
      GitError::MergeConflict { .. } => Some(
        "The local clone diverged from the remote. Delete it under `git.clone_root` to re-clone.".to_string(),
      ),
      GitError::MergeAbortFailed { path, .. } => Some(format!(
        "Delete the clone so the next run re-clones it: {}",
        path.display()
      )),
      GitError::RepoNotFound { path } => Some(format!(
        "Remove the directory so it can be cloned again: {}",
        path.display()
      )),
      GitError::WorkingCopyBusy { .. } => Some("Another relnotes run is using this clone. Wait for it to finish.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::RemoteBranchNotFound { repository, branch } => {
        write!(f, "Could not find remote branch '{}' in repository {}", branch, repository)
      }
      GitError::BranchNotFound { branch } => {
        write!(f, "Branch not found: {}", branch)
      }
      GitError::CommitNotFound { sha } => {
        write!(f, "Commit not found: {}", sha)
      }
      GitError::MergeConflict {
        repository,
        branch,
        details,
      } => {
        write!(
          f,
          "Updating branch '{}' in repository {} produced conflicts\n{}",
          branch, repository, details
        )
      }
      GitError::MergeAbortFailed { repository, path, details } => {
        write!(
          f,
          "Merge in repository {} failed and could not be aborted; {} is left mid-merge\n{}",
          repository,
          path.display(),
          details
        )
      }
      GitError::AuthenticationFailed { repository, details } => {
        write!(f, "Authentication failed for repository {}\n{}", repository, details)
      }
      GitError::CloneFailed { url, reason } => {
        write!(f, "Clone of {} failed: {}", url, reason)
      }
      GitError::WorkingCopyBusy { path } => {
        write!(f, "Working copy is locked by another process: {}", path.display())
      }
    }
  }
}

/// Issue tracker errors
#[derive(Debug)]
pub enum TrackerError {
  /// Request never produced a response (DNS, TLS, timeout, ...)
  Transport { url: String, message: String },

  /// Server answered with a non-success status
  Status { url: String, code: u16 },

  /// Response body did not match the expected shape
  Decode { url: String, message: String },
}

impl TrackerError {
  fn help_message(&self) -> Option<String> {
    match self {
      TrackerError::Status { code: 401, .. } | TrackerError::Status { code: 403, .. } => {
        Some("Check `tracker.api_key` or RELNOTES_TRACKER_API_KEY.".to_string())
      }
      TrackerError::Transport { .. } => Some("Check `tracker.server_url` and network access.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for TrackerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrackerError::Transport { url, message } => write!(f, "Tracker request to {} failed: {}", url, message),
      TrackerError::Status { url, code } => write!(f, "Tracker returned HTTP {} for {}", code, url),
      TrackerError::Decode { url, message } => {
        write!(f, "Tracker response from {} could not be decoded: {}", url, message)
      }
    }
  }
}

/// Result type alias for relnotes
pub type NotesResult<T> = Result<T, NotesError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> NotesResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> NotesResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<NotesError>,
{
  fn context(self, ctx: impl Into<String>) -> NotesResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> NotesResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &NotesError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for NotesError {
  fn from(err: anyhow::Error) -> Self {
    NotesError::message(err.to_string())
  }
}
