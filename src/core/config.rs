use crate::core::error::{ConfigError, NotesError, NotesResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to `repository_url_prefix + name`
pub const GIT_REPOSITORY_EXTENSION: &str = ".git";

/// Placeholder substituted with the target branch in `merge_marker`
pub const BRANCH_PLACEHOLDER: &str = "{branch}";

/// Environment variable overriding `git.secret`
pub const GIT_SECRET_ENV: &str = "RELNOTES_GIT_SECRET";

/// Environment variable overriding `tracker.api_key`
pub const TRACKER_API_KEY_ENV: &str = "RELNOTES_TRACKER_API_KEY";

/// Configuration for relnotes
/// Searched in order: relnotes.toml, .relnotes.toml, .config/relnotes.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
  pub git: GitConfig,
  pub tracker: TrackerConfig,
}

/// Source-control access and the repositories to mine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
  pub username: String,

  /// Password or personal access token (prompted for when absent)
  #[serde(default, skip_serializing)]
  pub secret: Option<String>,

  /// Remote URL = prefix + name + ".git"
  pub repository_url_prefix: String,

  /// Local clones live under `clone_root/<name>`
  pub clone_root: PathBuf,

  /// Merge message text identifying integration into a branch
  #[serde(default = "default_merge_marker")]
  pub merge_marker: String,

  #[serde(default = "default_remote")]
  pub remote: String,

  #[serde(default)]
  pub repositories: Vec<RepositoryTarget>,
}

fn default_merge_marker() -> String {
  "into '{branch}'".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

/// One configured repository to process
///
/// # Example
///
/// ```toml
/// [[git.repositories]]
/// name = "alpha"
/// branch = "release"
/// start_commit = "aaa111..."
/// version = "2.4.0"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTarget {
  pub name: String,
  pub branch: String,
  /// Commits authored before this commit are not part of the release
  pub start_commit: String,
  /// Release version label printed under the repository heading
  pub version: String,
}

/// Issue tracker access and output location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
  pub server_url: String,

  #[serde(default, skip_serializing)]
  pub api_key: String,

  /// Carried for parity with the tracker account; not used when mining
  #[serde(default)]
  pub target_user_id: Option<String>,

  pub output_file: PathBuf,

  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,

  #[serde(default = "default_connect_timeout_secs")]
  pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_connect_timeout_secs() -> u64 {
  10
}

impl AppConfig {
  /// Find config file in search order: relnotes.toml, .relnotes.toml, .config/relnotes.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("relnotes.toml"),
      path.join(".relnotes.toml"),
      path.join(".config").join("relnotes.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from an explicit file, or search `search_root`
  ///
  /// Environment overrides are applied before validation.
  pub fn load(explicit: Option<&Path>, search_root: &Path) -> NotesResult<Self> {
    let config_path = match explicit {
      Some(path) => path.to_path_buf(),
      None => Self::find_config_path(search_root).ok_or_else(|| {
        NotesError::Config(ConfigError::NotFound {
          search_root: search_root.to_path_buf(),
        })
      })?,
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let mut config = Self::parse(&content).with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
  }

  /// Parse config text without validating it
  pub fn parse(content: &str) -> NotesResult<Self> {
    Ok(toml_edit::de::from_str(content)?)
  }

  /// Replace secrets with non-empty values from the environment
  pub fn apply_env_overrides<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(secret) = lookup(GIT_SECRET_ENV).filter(|s| !s.is_empty()) {
      self.git.secret = Some(secret);
    }
    if let Some(key) = lookup(TRACKER_API_KEY_ENV).filter(|s| !s.is_empty()) {
      self.tracker.api_key = key;
    }
  }

  /// Validate required fields and repository list
  pub fn validate(&self) -> NotesResult<()> {
    require("git.username", &self.git.username)?;
    require("git.repository_url_prefix", &self.git.repository_url_prefix)?;
    require("git.remote", &self.git.remote)?;
    if self.git.clone_root.as_os_str().is_empty() {
      return Err(missing("git.clone_root"));
    }
    if !self.git.merge_marker.contains(BRANCH_PLACEHOLDER) {
      return Err(NotesError::Config(ConfigError::Invalid {
        field: "git.merge_marker".to_string(),
        reason: format!("must contain the {} placeholder", BRANCH_PLACEHOLDER),
      }));
    }

    require("tracker.server_url", &self.tracker.server_url)?;
    require("tracker.api_key", &self.tracker.api_key)?;
    if self.tracker.output_file.as_os_str().is_empty() {
      return Err(missing("tracker.output_file"));
    }
    if self.tracker.timeout_secs == 0 {
      return Err(NotesError::Config(ConfigError::Invalid {
        field: "tracker.timeout_secs".to_string(),
        reason: "must be greater than zero".to_string(),
      }));
    }

    if self.git.repositories.is_empty() {
      return Err(NotesError::with_help(
        "No repositories configured",
        "Add at least one [[git.repositories]] entry to the config",
      ));
    }

    let mut seen = HashSet::new();
    for (index, repo) in self.git.repositories.iter().enumerate() {
      require(&format!("git.repositories[{}].name", index), &repo.name)?;
      require(&format!("git.repositories[{}].branch", index), &repo.branch)?;
      require(&format!("git.repositories[{}].start_commit", index), &repo.start_commit)?;
      require(&format!("git.repositories[{}].version", index), &repo.version)?;
      if !seen.insert(repo.name.as_str()) {
        return Err(NotesError::Config(ConfigError::Invalid {
          field: format!("git.repositories[{}].name", index),
          reason: format!("repository '{}' is configured more than once", repo.name),
        }));
      }
    }

    Ok(())
  }

  /// Targets to process, in configured order, optionally restricted by name
  pub fn select_targets(&self, only: &[String]) -> NotesResult<Vec<RepositoryTarget>> {
    for name in only {
      if !self.git.repositories.iter().any(|r| &r.name == name) {
        return Err(NotesError::Config(ConfigError::RepositoryNotFound { name: name.clone() }));
      }
    }

    Ok(
      self
        .git
        .repositories
        .iter()
        .filter(|r| only.is_empty() || only.contains(&r.name))
        .cloned()
        .collect(),
    )
  }
}

impl GitConfig {
  /// Remote URL for a repository
  pub fn remote_url(&self, name: &str) -> String {
    format!("{}{}{}", self.repository_url_prefix, name, GIT_REPOSITORY_EXTENSION)
  }

  /// Local clone path for a repository
  pub fn local_path(&self, name: &str) -> PathBuf {
    self.clone_root.join(name)
  }
}

fn require(field: &str, value: &str) -> NotesResult<()> {
  if value.trim().is_empty() {
    return Err(missing(field));
  }
  Ok(())
}

fn missing(field: &str) -> NotesError {
  NotesError::Config(ConfigError::MissingField {
    field: field.to_string(),
  })
}
