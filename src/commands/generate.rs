use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::info;

use crate::core::config::{AppConfig, GIT_SECRET_ENV, GitConfig, RepositoryTarget};
use crate::core::credentials::{CredentialProvider, CredentialSource, Credentials, StaticCredentials, credential_source};
use crate::core::error::{ConfigError, ExitCode, NotesError, NotesResult};
use crate::notes::pipeline::{Generator, RepositoryStatus, RunReport};
use crate::notes::render::{render_to_string, write_document};
use crate::notes::tracker::RedmineTracker;
use crate::ui::prompt::MaskedPrompt;

/// Options for `relnotes generate`
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
  pub config_path: Option<PathBuf>,
  /// Overrides `tracker.output_file`
  pub output: Option<PathBuf>,
  /// Restrict the run to these repositories (empty = all)
  pub repositories: Vec<String>,
  /// Print the document instead of writing it
  pub dry_run: bool,
}

/// Run the generate command
///
/// Returns [`ExitCode::Partial`] when the document was produced but some
/// repositories were skipped or some issues could not be resolved.
pub fn run_generate(options: &GenerateOptions) -> NotesResult<ExitCode> {
  let current_dir = env::current_dir()?;
  let config = AppConfig::load(options.config_path.as_deref(), &current_dir)?;
  let targets = config.select_targets(&options.repositories)?;

  let credentials = obtain_credentials(&config.git, &targets)?;
  let tracker = RedmineTracker::new(&config.tracker)?;
  let output_path = options
    .output
    .clone()
    .unwrap_or_else(|| config.tracker.output_file.clone());

  info!(
    repositories = targets.len(),
    output = %output_path.display(),
    dry_run = options.dry_run,
    "generating release notes"
  );

  let report = Generator::new(&config.git, &credentials, tracker)
    .with_progress(true)
    .run(&targets);

  if options.dry_run {
    println!("\n📋 Release notes (dry-run, {} not written)\n", output_path.display());
    print!("{}", render_to_string(&report.document));
  } else {
    write_document(&report.document, &output_path)?;
    info!(output = %output_path.display(), "release notes written");
  }

  print_summary(&report, &output_path, options.dry_run);

  Ok(if report.is_partial() {
    ExitCode::Partial
  } else {
    ExitCode::Success
  })
}

/// Credentials for the selected targets: configured, anonymous, or prompted
fn obtain_credentials(git: &GitConfig, targets: &[RepositoryTarget]) -> NotesResult<Credentials> {
  let urls: Vec<String> = targets.iter().map(|t| git.remote_url(&t.name)).collect();
  let interactive = io::stdin().is_terminal();

  match credential_source(git.secret.as_deref(), &urls, interactive) {
    CredentialSource::Configured(secret) => StaticCredentials::new(secret).credentials(&git.username),
    CredentialSource::Anonymous => Ok(Credentials::anonymous(&git.username)),
    CredentialSource::Prompt => MaskedPrompt::new(format!("Password or token for {}", git.username)).credentials(&git.username),
    CredentialSource::Unavailable => Err(NotesError::Config(ConfigError::CredentialsUnavailable {
      reason: format!(
        "no secret configured and stdin is not a terminal (set git.secret or {})",
        GIT_SECRET_ENV
      ),
    })),
  }
}

fn print_summary(report: &RunReport, output_path: &std::path::Path, dry_run: bool) {
  let processed = report.outcomes.len() - report.skipped().count();

  println!();
  if dry_run {
    println!(
      "📝 {} issues from {} repositories (dry-run)",
      report.document.issue_count(),
      processed
    );
  } else {
    println!(
      "📝 Wrote {} issues from {} repositories to {}",
      report.document.issue_count(),
      processed,
      output_path.display()
    );
  }

  for outcome in &report.outcomes {
    match &outcome.status {
      RepositoryStatus::Skipped { reason } => {
        let first_line = reason.lines().next().unwrap_or(reason);
        println!("   ⚠️  {}: skipped ({})", outcome.name, first_line);
      }
      RepositoryStatus::Completed { unresolved, .. } if !unresolved.is_empty() => {
        let ids: Vec<String> = unresolved.iter().map(|id| format!("#{}", id)).collect();
        println!("   ⚠️  {}: unresolved {}", outcome.name, ids.join(", "));
      }
      RepositoryStatus::Completed {
        selected_commits,
        issues,
        unreferenced_commits,
        ..
      } => {
        println!(
          "   ✅ {}: {} issues from {} merge commits ({} without reference)",
          outcome.name, issues, selected_commits, unreferenced_commits
        );
      }
    }
  }
}
