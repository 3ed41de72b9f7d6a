//! # copysmith-orchestrator
//!
//! The quality-gated revision engine for Copysmith.
//!
//! This crate provides:
//! - The revision loop tying writer, validator, and reviser together
//! - The named circuit-breaker registry injected at the composition root
//! - Built-in tools for the writer's conversation loop
//! - Best-effort persistence of completed workflow results

mod breakers;
mod persistence;
mod prompt;
mod revision;
mod tools;

pub use breakers::{BreakerRegistry, GRADING_BREAKER};
pub use persistence::{ExecutionStore, JsonlStore, NullStore};
pub use prompt::{build_reviser_prompt, build_system_context, build_writer_prompt};
pub use revision::RevisionLoop;
pub use tools::{ResearchLookupTool, SnippetGeneratorTool};
