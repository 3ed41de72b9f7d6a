//! # copysmith-core
//!
//! Core types for the Copysmith content workflow engine.
//!
//! Copysmith drives a multi-turn exchange with an LLM completion service
//! that can request tool execution, then pushes the resulting draft through
//! a hybrid validation-and-revision loop until a quality score threshold is
//! met or the iteration budget runs out.
//!
//! This crate holds the shared data model, the unified error type, and the
//! configuration layer; no I/O beyond config-file loading happens here.

mod config;
mod error;
mod types;

pub use config::{
    BreakerConfig, CopysmithConfig, ModelConfig, ToolTimeouts, ValidationTuning, WorkflowDefaults,
};
pub use error::{CopysmithError, Result};
pub use types::*;
