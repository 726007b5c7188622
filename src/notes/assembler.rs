//! Accumulate resolved issues per repository and build the document model

use crate::core::config::RepositoryTarget;
use crate::notes::reference::IssueId;
use crate::notes::tracker::Issue;
use tracing::debug;

/// One repository's part of the release notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySection {
  pub name: String,
  pub version: String,
  /// Sorted by tracker name; ties keep discovery order
  pub issues: Vec<Issue>,
}

/// Finalized release notes, sections in configured order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseNoteDocument {
  pub sections: Vec<RepositorySection>,
}

impl ReleaseNoteDocument {
  pub fn issue_count(&self) -> usize {
    self.sections.iter().map(|s| s.issues.len()).sum()
  }

  pub fn section(&self, name: &str) -> Option<&RepositorySection> {
    self.sections.iter().find(|s| s.name == name)
  }
}

/// Pending section, issues in discovery order
#[derive(Debug)]
struct SectionBuilder {
  name: String,
  version: String,
  issues: Vec<Issue>,
}

/// Collects issues across repositories
///
/// Repositories must be registered with [`begin_repository`] before issues
/// are added to them; registration order becomes the section order.
///
/// [`begin_repository`]: ReleaseNoteAssembler::begin_repository
#[derive(Debug, Default)]
pub struct ReleaseNoteAssembler {
  sections: Vec<SectionBuilder>,
}

impl ReleaseNoteAssembler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Open a section for a repository (no-op when already open)
  pub fn begin_repository(&mut self, target: &RepositoryTarget) {
    if self.sections.iter().any(|s| s.name == target.name) {
      return;
    }
    self.sections.push(SectionBuilder {
      name: target.name.clone(),
      version: target.version.clone(),
      issues: Vec::new(),
    });
  }

  /// Whether `repository` already lists an issue with this identifier
  pub fn contains(&self, repository: &str, id: &IssueId) -> bool {
    self
      .find(repository)
      .is_some_and(|section| section.issues.iter().any(|i| i.id.matches(id)))
  }

  /// Add an issue to an open section
  ///
  /// Returns `false` when the identifier is already present for that
  /// repository or the repository was never opened.
  pub fn add(&mut self, repository: &str, issue: Issue) -> bool {
    let Some(section) = self.sections.iter_mut().find(|s| s.name == repository) else {
      debug!(repository, issue = %issue.id, "issue for unregistered repository ignored");
      return false;
    };

    if section.issues.iter().any(|i| i.id.matches(&issue.id)) {
      debug!(repository, issue = %issue.id, "duplicate issue skipped");
      return false;
    }

    section.issues.push(issue);
    true
  }

  /// Build the document; issues are stably sorted by tracker name
  pub fn finalize(self) -> ReleaseNoteDocument {
    let sections = self
      .sections
      .into_iter()
      .map(|builder| {
        let mut issues = builder.issues;
        issues.sort_by(|a, b| a.tracker.cmp(&b.tracker));
        RepositorySection {
          name: builder.name,
          version: builder.version,
          issues,
        }
      })
      .collect();

    ReleaseNoteDocument { sections }
  }

  fn find(&self, repository: &str) -> Option<&SectionBuilder> {
    self.sections.iter().find(|s| s.name == repository)
  }
}
