//! # Workflow
//!
//! End-to-end run on one input: convert, extract audio, preview, mux. Each
//! stage leaves its file in the output directory and is skipped on the next
//! run unless overwriting is requested.

pub mod engine;
pub mod paths;

pub use engine::{Workflow, WorkflowReport};
pub use paths::OutputPaths;
