//! Tests for the relnotes binary

use crate::helpers::*;
use anyhow::Result;
use tempfile::TempDir;

fn stdout_of(output: &std::process::Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &std::process::Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_missing_config_is_user_error() -> Result<()> {
  let dir = TempDir::new()?;
  let output = run_relnotes(dir.path(), &["generate"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr_of(&output).contains("No relnotes configuration found"));
  Ok(())
}

#[test]
fn test_config_command_masks_secrets() -> Result<()> {
  let fixture = Fixture::new()?;
  let config = fixture.write_config("http://127.0.0.1:9", &[target("alpha", "release", "aaa111", "2.4.0")])?;

  let output = run_relnotes(&fixture.path, &["config", "--json", "--config", &config.display().to_string()])?;

  assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_of(&output));
  let json: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;
  assert_eq!(json["tracker_api_key"], "********");
  assert_eq!(json["secret"], "(not set)");
  assert_eq!(json["repositories"][0]["name"], "alpha");
  assert!(!stdout_of(&output).contains("test-key"));
  Ok(())
}

#[test]
fn test_invalid_config_value_is_validation_error() -> Result<()> {
  let fixture = Fixture::new()?;
  let config = fixture.write_config("http://127.0.0.1:9", &[target("alpha", "release", "aaa111", "2.4.0")])?;
  let text = std::fs::read_to_string(&config)?.replace("timeout_secs = 5", "timeout_secs = 0");
  std::fs::write(&config, text)?;

  // Found by the search order, no --config needed
  let output = run_relnotes(&fixture.path, &["config"])?;
  assert_eq!(output.status.code(), Some(3));
  Ok(())
}

#[test]
fn test_unknown_repository_filter_is_rejected() -> Result<()> {
  let fixture = Fixture::new()?;
  fixture.write_config("http://127.0.0.1:9", &[target("alpha", "release", "aaa111", "2.4.0")])?;

  let output = run_relnotes(&fixture.path, &["generate", "--repo", "gamma"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr_of(&output).contains("Repository 'gamma' not found"));
  Ok(())
}

#[test]
fn test_missing_start_commit_exits_partial() -> Result<()> {
  let fixture = Fixture::new()?;
  let alpha = fixture.repository("alpha")?;
  alpha.branch("release")?;
  alpha.push("release")?;
  // Tracker is never queried, so an unreachable address is fine
  fixture.write_config(
    "http://127.0.0.1:9",
    &[target("alpha", "release", "0123456789abcdef0123456789abcdef01234567", "1.0")],
  )?;

  let output = run_relnotes(&fixture.path, &["generate"])?;

  assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr_of(&output));
  assert_eq!(read_notes(&fixture.output_file())?, "");
  assert!(stdout_of(&output).contains("alpha: skipped"));
  Ok(())
}

#[test]
fn test_generate_against_tracker_stub() -> Result<()> {
  let fixture = Fixture::new()?;
  let alpha = fixture.repository("alpha")?;
  alpha.branch("release")?;
  let start = alpha.commit_at("CHANGELOG.md", "start\n", "Start", "2024-02-01T09:00:00+00:00")?;
  alpha.merge_feature("release", "one", "Closes #10", "2024-02-02T10:00:00+00:00")?;
  alpha.merge_feature("release", "two", "Closes #20", "2024-02-03T10:00:00+00:00")?;
  alpha.merge_feature("release", "three", "Again #10", "2024-02-04T10:00:00+00:00")?;
  alpha.push("release")?;

  let tracker_url = spawn_redmine_stub(vec![(10, "Feature", "Export", false), (20, "Bug", "Crash", true)])?;
  fixture.write_config(&tracker_url, &[target("alpha", "release", &start, "2.4.0")])?;

  let output = run_relnotes(&fixture.path, &["generate"])?;
  assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_of(&output));

  let notes = read_notes(&fixture.output_file())?;
  assert_eq!(notes, "## Alpha\n- 2.4.0\n- Bug #20: Crash\n- Feature #10: Export\n\n");
  assert!(stdout_of(&output).contains("| Feature #10: Export"));

  // Second run is byte-identical
  let first = std::fs::read(fixture.output_file())?;
  let output = run_relnotes(&fixture.path, &["generate"])?;
  assert_eq!(output.status.code(), Some(0));
  assert_eq!(first, std::fs::read(fixture.output_file())?);
  Ok(())
}

#[test]
fn test_dry_run_does_not_write() -> Result<()> {
  let fixture = Fixture::new()?;
  let alpha = fixture.repository("alpha")?;
  alpha.branch("release")?;
  let start = alpha.commit_at("CHANGELOG.md", "start\n", "Start", "2024-02-01T09:00:00+00:00")?;
  alpha.merge_feature("release", "one", "No reference here", "2024-02-02T10:00:00+00:00")?;
  alpha.push("release")?;
  fixture.write_config("http://127.0.0.1:9", &[target("alpha", "release", &start, "2.4.0")])?;

  let output = run_relnotes(&fixture.path, &["generate", "--dry-run"])?;

  assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_of(&output));
  assert!(stdout_of(&output).contains("## Alpha\n- 2.4.0\n"));
  assert!(!fixture.output_file().exists());
  Ok(())
}

#[test]
fn test_unwritable_output_is_system_error() -> Result<()> {
  let fixture = Fixture::new()?;
  let alpha = fixture.repository("alpha")?;
  alpha.branch("release")?;
  let start = alpha.commit_at("CHANGELOG.md", "start\n", "Start", "2024-02-01T09:00:00+00:00")?;
  alpha.merge_feature("release", "one", "No reference here", "2024-02-02T10:00:00+00:00")?;
  alpha.push("release")?;
  fixture.write_config("http://127.0.0.1:9", &[target("alpha", "release", &start, "2.4.0")])?;

  let output_path = fixture.path.join("missing").join("notes.md");
  let output = run_relnotes(&fixture.path, &["generate", "-o", &output_path.display().to_string()])?;

  assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr_of(&output));
  assert!(stderr_of(&output).contains("Failed to create temporary file"));
  assert!(!output_path.exists());
  Ok(())
}
