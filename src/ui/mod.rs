//! Terminal interaction: progress bars and the masked secret prompt

pub mod progress;
pub mod prompt;
