//! Release-note generation
//!
//! Leaf-first:
//!
//! - **synchronizer**: clone or update a working copy of each repository
//! - **selector**: merge commits into the release branch since the start commit
//! - **reference**: `#<digits>` issue references in commit messages
//! - **tracker**: issue lookup (open, then closed) against the tracker
//! - **assembler**: per-repository deduplicated issue lists
//! - **render**: the Markdown-like output file
//! - **pipeline**: runs all of the above over the configured targets

pub mod assembler;
pub mod pipeline;
pub mod reference;
pub mod render;
pub mod selector;
pub mod synchronizer;
pub mod tracker;

pub use assembler::{ReleaseNoteAssembler, ReleaseNoteDocument, RepositorySection};
pub use pipeline::{Generator, RepositoryOutcome, RepositoryStatus, RunReport};
pub use reference::{IssueId, extract_issue_reference};
pub use render::{render_to_string, write_document};
pub use selector::{CommitSelector, Selection};
pub use synchronizer::{RepositorySynchronizer, SyncRequest, WorkingCopy};
