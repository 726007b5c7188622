use serde::Serialize;
use std::env;
use std::path::PathBuf;

use crate::core::config::AppConfig;
use crate::core::error::{NotesError, NotesResult};

/// Resolved view of one repository target
#[derive(Debug, Clone, Serialize)]
pub struct TargetView {
  pub name: String,
  pub branch: String,
  pub start_commit: String,
  pub version: String,
  pub remote_url: String,
  pub local_path: PathBuf,
}

/// Resolved configuration with secrets masked
#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
  pub username: String,
  pub secret: String,
  pub merge_marker: String,
  pub remote: String,
  pub tracker_url: String,
  pub tracker_api_key: String,
  pub target_user_id: Option<String>,
  pub output_file: PathBuf,
  pub repositories: Vec<TargetView>,
}

impl ConfigView {
  pub fn from_config(config: &AppConfig) -> Self {
    let git = &config.git;
    Self {
      username: git.username.clone(),
      secret: mask(git.secret.as_deref().unwrap_or("")),
      merge_marker: git.merge_marker.clone(),
      remote: git.remote.clone(),
      tracker_url: config.tracker.server_url.clone(),
      tracker_api_key: mask(&config.tracker.api_key),
      target_user_id: config.tracker.target_user_id.clone(),
      output_file: config.tracker.output_file.clone(),
      repositories: git
        .repositories
        .iter()
        .map(|r| TargetView {
          name: r.name.clone(),
          branch: r.branch.clone(),
          start_commit: r.start_commit.clone(),
          version: r.version.clone(),
          remote_url: git.remote_url(&r.name),
          local_path: git.local_path(&r.name),
        })
        .collect(),
    }
  }
}

fn mask(secret: &str) -> String {
  if secret.is_empty() {
    "(not set)".to_string()
  } else {
    "********".to_string()
  }
}

/// Run the config command: load, validate, print
pub fn run_config(config_path: Option<PathBuf>, json: bool) -> NotesResult<()> {
  let current_dir = env::current_dir()?;
  let config = AppConfig::load(config_path.as_deref(), &current_dir)?;
  let view = ConfigView::from_config(&config);

  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(&view).map_err(|e| NotesError::message(format!("Serialization error: {}", e)))?
    );
  } else {
    print_config(&view);
  }

  Ok(())
}

fn print_config(view: &ConfigView) {
  println!("\n⚙️  Configuration\n");
  println!("  git user:      {} (secret: {})", view.username, view.secret);
  println!("  merge marker:  {} (remote: {})", view.merge_marker, view.remote);
  println!("  tracker:       {} (api key: {})", view.tracker_url, view.tracker_api_key);
  println!("  output file:   {}", view.output_file.display());

  println!("\n{:<20} {:<16} {:<14} {:<12} REMOTE", "REPOSITORY", "BRANCH", "START", "VERSION");
  println!("{:-<100}", "");
  for repo in &view.repositories {
    let start = repo.start_commit.get(..12).unwrap_or(&repo.start_commit);
    println!(
      "{:<20} {:<16} {:<14} {:<12} {}",
      repo.name, repo.branch, start, repo.version, repo.remote_url
    );
    println!("{:<20} -> {}", "", repo.local_path.display());
  }
  println!();
}
