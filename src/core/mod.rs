// Public modules
pub mod build;
pub mod bump;
pub mod config;
pub mod error;
pub mod gates;
pub mod git;
pub mod hosting;
pub mod matrix;
pub mod nightly;
pub mod notes;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod release;
pub mod status;
pub mod trigger;
pub mod version;
pub mod workflow;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
