//! Generic utility primitives with zero release knowledge.
//!
//! - `artifact` - Artifact path resolution and digests
//! - `command` - Command execution with error handling
//! - `io` - File I/O with consistent error handling
//! - `template` - String template rendering

pub mod artifact;
pub mod command;
pub mod io;
pub mod template;
