//! CLI commands for relnotes
//!
//! - **generate**: run the pipeline and write the release notes
//! - **config**: show the resolved configuration with secrets masked

pub mod config;
pub mod generate;

pub use config::run_config;
pub use generate::{GenerateOptions, run_generate};
