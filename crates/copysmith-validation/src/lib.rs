//! # copysmith-validation
//!
//! The hybrid quality layer: a deterministic, pure validator
//! (pattern and structural checks with per-platform profiles), the
//! auto-fix rewrites for the issues that have one, and the model-based
//! grader that scores what patterns cannot judge.
//!
//! Determinism boundary: everything in this crate except [`Grader`] is
//! side-effect free and reproducible. The grader is the only component
//! that talks to the completion service.

mod autofix;
mod grading;
mod rules;
mod structure;
mod validator;

pub use autofix::apply_auto_fixes;
pub use grading::{parse_grading, Grader};
pub use validator::{HybridValidator, ValidationTool};
