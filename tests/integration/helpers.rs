//! Test helpers for integration tests

use anyhow::{Context, Result};
use relnotes::core::config::{GitConfig, RepositoryTarget};
use relnotes::core::error::TrackerError;
use relnotes::notes::IssueId;
use relnotes::notes::tracker::{Issue, IssueScope, IssueStatus, IssueTracker};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Remotes, seed checkouts and clone root under one temp directory
///
/// ```text
/// <root>/remotes/<name>.git   bare repository used as the remote
/// <root>/seeds/<name>         checkout used to author history
/// <root>/clones/<name>        working copies created by relnotes
/// ```
pub struct Fixture {
  _root: TempDir,
  pub path: PathBuf,
}

impl Fixture {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    for dir in ["remotes", "seeds", "clones"] {
      std::fs::create_dir_all(path.join(dir))?;
    }
    Ok(Self { _root: root, path })
  }

  /// Prefix such that prefix + name + ".git" is the bare remote
  pub fn url_prefix(&self) -> String {
    format!("{}/", self.path.join("remotes").display())
  }

  pub fn clone_root(&self) -> PathBuf {
    self.path.join("clones")
  }

  /// Create a bare remote and a seed checkout with one commit on `main`
  pub fn repository(&self, name: &str) -> Result<SeedRepo> {
    let bare = self.path.join("remotes").join(format!("{}.git", name));
    git(&self.path, &["init", "--bare", "--initial-branch=main", &bare.display().to_string()])?;

    let seed = self.path.join("seeds").join(name);
    std::fs::create_dir_all(&seed)?;
    git(&seed, &["init", "--initial-branch=main"])?;
    git(&seed, &["remote", "add", "origin", &bare.display().to_string()])?;

    let repo = SeedRepo { path: seed };
    repo.commit_at("README.md", &format!("# {}\n", name), "Initial commit", "2024-01-01T00:00:00+00:00")?;
    repo.push("main")?;
    Ok(repo)
  }

  pub fn git_config(&self, targets: Vec<RepositoryTarget>) -> GitConfig {
    GitConfig {
      username: "tester".to_string(),
      secret: None,
      repository_url_prefix: self.url_prefix(),
      clone_root: self.clone_root(),
      merge_marker: "into '{branch}'".to_string(),
      remote: "origin".to_string(),
      repositories: targets,
    }
  }

  /// A full relnotes.toml pointing at this fixture
  pub fn write_config(&self, tracker_url: &str, targets: &[RepositoryTarget]) -> Result<PathBuf> {
    let mut text = format!(
      r#"[git]
username = "tester"
repository_url_prefix = "{prefix}"
clone_root = "{clones}"

[tracker]
server_url = "{tracker_url}"
api_key = "test-key"
output_file = "{output}"
timeout_secs = 5
connect_timeout_secs = 2
"#,
      prefix = self.url_prefix(),
      clones = self.clone_root().display(),
      output = self.output_file().display(),
    );

    for t in targets {
      text.push_str(&format!(
        "\n[[git.repositories]]\nname = \"{}\"\nbranch = \"{}\"\nstart_commit = \"{}\"\nversion = \"{}\"\n",
        t.name, t.branch, t.start_commit, t.version
      ));
    }

    let path = self.path.join("relnotes.toml");
    std::fs::write(&path, text)?;
    Ok(path)
  }

  pub fn output_file(&self) -> PathBuf {
    self.path.join("RELEASE_NOTES.md")
  }
}

pub fn target(name: &str, branch: &str, start_commit: &str, version: &str) -> RepositoryTarget {
  RepositoryTarget {
    name: name.to_string(),
    branch: branch.to_string(),
    start_commit: start_commit.to_string(),
    version: version.to_string(),
  }
}

/// Checkout used to author a remote's history
pub struct SeedRepo {
  pub path: PathBuf,
}

impl SeedRepo {
  /// Write a file and commit it with author and committer date `date`
  pub fn commit_at(&self, file: &str, content: &str, message: &str, date: &str) -> Result<String> {
    std::fs::write(self.path.join(file), content)?;
    git(&self.path, &["add", "."])?;
    git_at(&self.path, &["commit", "-m", message], date)?;
    self.head()
  }

  /// Branch off the current HEAD
  pub fn branch(&self, name: &str) -> Result<()> {
    git(&self.path, &["checkout", "-b", name])?;
    Ok(())
  }

  pub fn checkout(&self, name: &str) -> Result<()> {
    git(&self.path, &["checkout", name])?;
    Ok(())
  }

  /// Feature branch with one commit, merged with `--no-ff` into `into`
  ///
  /// The merge message is `Merge branch '<feature>' into '<into>'` followed by
  /// `body`; author and commit dates are `date`.
  pub fn merge_feature(&self, into: &str, feature: &str, body: &str, date: &str) -> Result<String> {
    self.checkout(into)?;
    self.branch(feature)?;
    self.commit_at(&format!("{}.txt", feature), feature, &format!("Work on {}", feature), date)?;
    self.checkout(into)?;

    let message = format!("Merge branch '{}' into '{}'\n\n{}", feature, into, body);
    git_at(&self.path, &["merge", "--no-ff", "-m", &message, feature], date)?;
    self.head()
  }

  pub fn push(&self, branch: &str) -> Result<()> {
    git(&self.path, &["push", "origin", branch])?;
    Ok(())
  }

  pub fn delete_remote_branch(&self, branch: &str) -> Result<()> {
    git(&self.path, &["push", "origin", "--delete", branch])?;
    Ok(())
  }

  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  git_at(cwd, args, "2024-01-01T00:00:00+00:00")
}

/// Run git command with fixed identity and author / committer dates
pub fn git_at(cwd: &Path, args: &[&str], date: &str) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .env("GIT_AUTHOR_NAME", "Test User")
    .env("GIT_AUTHOR_EMAIL", "test@example.com")
    .env("GIT_COMMITTER_NAME", "Test User")
    .env("GIT_COMMITTER_EMAIL", "test@example.com")
    .env("GIT_AUTHOR_DATE", date)
    .env("GIT_COMMITTER_DATE", date)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the relnotes binary; non-zero exits are returned, not raised
pub fn run_relnotes(cwd: &Path, args: &[&str]) -> Result<Output> {
  let relnotes_bin = env!("CARGO_BIN_EXE_relnotes");

  let mut cmd = Command::new(relnotes_bin);
  cmd
    .current_dir(cwd)
    .args(args)
    .env("RUST_LOG", "warn")
    .env_remove("RELNOTES_GIT_SECRET")
    .env_remove("RELNOTES_TRACKER_API_KEY");
  // The tracker stub listens on localhost
  for proxy in ["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "http_proxy", "https_proxy", "all_proxy"] {
    cmd.env_remove(proxy);
  }

  cmd.output().context("Failed to run relnotes")
}

/// In-memory tracker recording every query
#[derive(Default)]
pub struct MemoryTracker {
  issues: HashMap<String, (String, String, IssueStatus)>,
  pub queries: RefCell<Vec<(String, IssueScope)>>,
}

impl MemoryTracker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_issue(mut self, id: u64, tracker: &str, subject: &str, status: IssueStatus) -> Self {
    self
      .issues
      .insert(id.to_string(), (tracker.to_string(), subject.to_string(), status));
    self
  }
}

impl IssueTracker for MemoryTracker {
  fn find_issue(&self, id: &IssueId, scope: IssueScope) -> Result<Option<Issue>, TrackerError> {
    self.queries.borrow_mut().push((id.to_string(), scope));

    let wanted = match scope {
      IssueScope::Open => IssueStatus::Open,
      IssueScope::Closed => IssueStatus::Closed,
    };

    Ok(
      self
        .issues
        .get(id.as_str())
        .filter(|(_, _, status)| *status == wanted)
        .map(|(tracker, subject, status)| Issue {
          id: id.clone(),
          tracker: tracker.clone(),
          subject: subject.clone(),
          status: *status,
        }),
    )
  }
}

/// Minimal Redmine stand-in serving `/issues.json` on localhost
///
/// `issues` maps an id to `(tracker, subject, closed)`. Runs until the test
/// process exits.
pub fn spawn_redmine_stub(issues: Vec<(u64, &'static str, &'static str, bool)>) -> Result<String> {
  let listener = TcpListener::bind("127.0.0.1:0")?;
  let address = listener.local_addr()?;

  std::thread::spawn(move || {
    for stream in listener.incoming() {
      let Ok(mut stream) = stream else { continue };

      let mut reader = BufReader::new(&stream);
      let mut request_line = String::new();
      if reader.read_line(&mut request_line).is_err() {
        continue;
      }
      // Drain headers
      let mut line = String::new();
      while reader.read_line(&mut line).map(|n| n > 2).unwrap_or(false) {
        line.clear();
      }

      let target = request_line.split_whitespace().nth(1).unwrap_or("");
      let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");
      let issue_id = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("issue_id="))
        .and_then(|id| id.parse::<u64>().ok());
      let closed_scope = query.split('&').any(|pair| pair == "status_id=closed");

      let found = issues
        .iter()
        .filter(|(id, _, _, closed)| Some(*id) == issue_id && *closed == closed_scope)
        .map(|(id, tracker, subject, closed)| {
          format!(
            r#"{{"id":{},"tracker":{{"id":1,"name":"{}"}},"status":{{"id":1,"name":"x","is_closed":{}}},"subject":"{}"}}"#,
            id, tracker, closed, subject
          )
        })
        .collect::<Vec<_>>();
      let body = format!(r#"{{"issues":[{}],"total_count":{}}}"#, found.join(","), found.len());

      let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
      );
      let _ = stream.write_all(response.as_bytes());
    }
  });

  Ok(format!("http://{}", address))
}

/// Read a file written by relnotes, checking and stripping the BOM
pub fn read_notes(path: &Path) -> Result<String> {
  let bytes = std::fs::read(path)?;
  anyhow::ensure!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]), "missing UTF-8 BOM");
  Ok(String::from_utf8(bytes[3..].to_vec())?)
}
