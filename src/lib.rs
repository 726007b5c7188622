//! relnotes: release notes from merge commits and tracker issues
//!
//! For every configured repository the working copy is synchronized, the
//! merge commits that landed on the release branch since a start commit are
//! collected, the `#<id>` each one references is resolved against the issue
//! tracker, and the issues are written grouped per repository.

pub mod commands;
pub mod core;
pub mod notes;
pub mod ui;
pub mod utils;
