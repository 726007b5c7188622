//! Tests for working-copy synchronization against a local bare remote

use crate::helpers::*;
use anyhow::Result;
use relnotes::core::credentials::Credentials;
use relnotes::core::error::{GitError, NotesError};
use relnotes::notes::{CommitSelector, RepositorySynchronizer, Selection, SyncRequest};
use std::path::Path;

fn synchronize(fixture: &Fixture, name: &str, branch: &str) -> Result<relnotes::notes::WorkingCopy, NotesError> {
  let credentials = Credentials::anonymous("tester");
  let synchronizer = RepositorySynchronizer::new(&credentials, "origin");
  let local_path = fixture.clone_root().join(name);
  let remote_url = format!("{}{}.git", fixture.url_prefix(), name);

  synchronizer.synchronize(&SyncRequest {
    name,
    branch,
    local_path: &local_path,
    remote_url: &remote_url,
  })
}

fn head_of(path: &Path) -> Result<String> {
  let output = git(path, &["rev-parse", "HEAD"])?;
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[test]
fn test_clone_then_update_picks_up_new_merges() -> Result<()> {
  let fixture = Fixture::new()?;
  let seed = fixture.repository("alpha")?;
  seed.branch("release")?;
  let start = seed.commit_at("CHANGELOG.md", "start\n", "Start", "2024-02-01T09:00:00+00:00")?;
  seed.merge_feature("release", "one", "Closes #1", "2024-02-02T10:00:00+00:00")?;
  seed.push("release")?;

  let clone_path = fixture.clone_root().join("alpha");
  {
    let _working_copy = synchronize(&fixture, "alpha", "release")?;
    assert_eq!(head_of(&clone_path)?, seed.head()?);
  }

  let merge_two = seed.merge_feature("release", "two", "Closes #2", "2024-02-03T10:00:00+00:00")?;
  seed.push("release")?;

  let working_copy = synchronize(&fixture, "alpha", "release")?;
  assert_eq!(head_of(&clone_path)?, merge_two);

  let selector = CommitSelector::new("origin", "into '{branch}'");
  match selector.select(working_copy.git(), "release", &start)? {
    Selection::Commits(commits) => {
      let subjects: Vec<_> = commits.iter().map(|c| c.subject().to_string()).collect();
      assert_eq!(
        subjects,
        vec!["Merge branch 'one' into 'release'", "Merge branch 'two' into 'release'"]
      );
    }
    other => panic!("unexpected selection: {:?}", other),
  }
  Ok(())
}

#[test]
fn test_update_creates_tracking_branch_for_new_target() -> Result<()> {
  let fixture = Fixture::new()?;
  let seed = fixture.repository("alpha")?;
  seed.branch("release")?;
  seed.merge_feature("release", "one", "Closes #1", "2024-02-02T10:00:00+00:00")?;
  seed.push("release")?;

  // First clone on main, then switch the target to release
  drop(synchronize(&fixture, "alpha", "main")?);
  let working_copy = synchronize(&fixture, "alpha", "release")?;

  assert_eq!(working_copy.git().current_branch()?, "release");
  assert_eq!(
    working_copy.git().upstream_of("release")?.as_deref(),
    Some("origin/release")
  );
  assert_eq!(head_of(&fixture.clone_root().join("alpha"))?, seed.head()?);
  Ok(())
}

#[test]
fn test_deleted_remote_branch_is_reported() -> Result<()> {
  let fixture = Fixture::new()?;
  let seed = fixture.repository("alpha")?;
  seed.branch("release")?;
  seed.push("release")?;

  drop(synchronize(&fixture, "alpha", "release")?);
  seed.delete_remote_branch("release")?;

  match synchronize(&fixture, "alpha", "release") {
    Err(NotesError::Git(GitError::RemoteBranchNotFound { repository, branch })) => {
      assert_eq!(repository, "alpha");
      assert_eq!(branch, "release");
    }
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("expected RemoteBranchNotFound"),
  }
  Ok(())
}

#[test]
fn test_conflicting_update_fails_and_releases_lock() -> Result<()> {
  let fixture = Fixture::new()?;
  let seed = fixture.repository("alpha")?;
  seed.branch("release")?;
  seed.push("release")?;

  let clone_path = fixture.clone_root().join("alpha");
  drop(synchronize(&fixture, "alpha", "release")?);

  // Diverging edits to the same file
  std::fs::write(clone_path.join("README.md"), "local edit\n")?;
  git(&clone_path, &["commit", "-am", "Local edit"])?;
  let local_head = head_of(&clone_path)?;
  seed.commit_at("README.md", "remote edit\n", "Remote edit", "2024-02-02T10:00:00+00:00")?;
  seed.push("release")?;

  match synchronize(&fixture, "alpha", "release") {
    Err(NotesError::Git(GitError::MergeConflict { repository, .. })) => assert_eq!(repository, "alpha"),
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("expected MergeConflict"),
  }

  // Merge aborted, lock gone
  assert_eq!(head_of(&clone_path)?, local_head);
  assert_eq!(std::fs::read_to_string(clone_path.join("README.md"))?, "local edit\n");
  assert!(!clone_path.join(".git").join("relnotes.lock").exists());
  Ok(())
}

#[test]
fn test_concurrent_acquisition_is_refused() -> Result<()> {
  let fixture = Fixture::new()?;
  let seed = fixture.repository("alpha")?;
  seed.branch("release")?;
  seed.push("release")?;

  let _held = synchronize(&fixture, "alpha", "release")?;
  match synchronize(&fixture, "alpha", "release") {
    Err(NotesError::Git(GitError::WorkingCopyBusy { .. })) => {}
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("expected WorkingCopyBusy"),
  }
  Ok(())
}
