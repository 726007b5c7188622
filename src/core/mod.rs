//! Core building blocks shared by every command
//!
//! - **config**: relnotes.toml parsing, environment overrides and validation
//! - **credentials**: source-control credentials and their providers
//! - **error**: error types with contextual help messages and exit codes
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod credentials;
pub mod error;
pub mod vcs;
