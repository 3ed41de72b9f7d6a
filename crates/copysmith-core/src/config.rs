//! Configuration management for Copysmith
//!
//! Loads workflow, breaker, tool-timeout, and validation tuning from
//! `copysmith.toml`, falling back to conservative defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{CopysmithError, Result};

/// Repository-level Copysmith configuration
///
/// Loaded from `copysmith.toml` in the working directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopysmithConfig {
    /// Model selection
    #[serde(default)]
    pub models: ModelConfig,

    /// Workflow execution defaults
    #[serde(default)]
    pub workflow: WorkflowDefaults,

    /// Circuit breaker policy for completion-service integration points
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Per-call tool timeouts
    #[serde(default)]
    pub tools: ToolTimeouts,

    /// Deterministic validation tuning
    #[serde(default)]
    pub validation: ValidationTuning,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Default model to use
    #[serde(default = "default_model")]
    pub default: String,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Default workflow execution parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefaults {
    /// Quality gate: minimum grading score to stop revising
    #[serde(default = "default_target_score")]
    pub target_score: u8,

    /// Maximum reviser invocations per workflow run
    #[serde(default = "default_max_revisions")]
    pub max_revisions: usize,

    /// Maximum completion-service turns per conversation run
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Maximum tokens per completion response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

/// Circuit breaker policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds an open breaker waits before allowing a trial call
    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout_secs: u64,
}

/// Per-call tool execution timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTimeouts {
    /// Budget for ordinary tools (research lookups, sub-generators)
    #[serde(default = "default_general_timeout")]
    pub general_secs: u64,

    /// Budget for composite tools that fan out to grading plus detection
    /// sub-calls; sized as the sum of the sub-call budgets with margin
    #[serde(default = "default_composite_timeout")]
    pub composite_secs: u64,
}

/// Tuning knobs for the deterministic checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationTuning {
    /// Maximum sentence gap at which a negative clause followed by a
    /// positive clause still counts as a masked contrast. Legitimate
    /// reframing with more sentences in between is not flagged.
    #[serde(default = "default_contrast_sentence_gap")]
    pub contrast_sentence_gap: usize,
}

// Default value providers
fn default_model() -> String {
    "sonnet".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_target_score() -> u8 {
    85
}

fn default_max_revisions() -> usize {
    3
}

fn default_max_turns() -> usize {
    10
}

fn default_max_tokens() -> usize {
    4096
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_recovery_timeout() -> u64 {
    120
}

fn default_general_timeout() -> u64 {
    30
}

fn default_composite_timeout() -> u64 {
    120
}

fn default_contrast_sentence_gap() -> usize {
    1
}

impl CopysmithConfig {
    /// Load configuration from `copysmith.toml` or use defaults
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join("copysmith.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)
                .map_err(|e| CopysmithError::Config(format!("Failed to parse config file: {}", e)))
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `copysmith.toml`
    pub fn write_default(dir: &Path) -> Result<()> {
        let config_path = dir.join("copysmith.toml");
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| CopysmithError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for WorkflowDefaults {
    fn default() -> Self {
        Self {
            target_score: default_target_score(),
            max_revisions: default_max_revisions(),
            max_turns: default_max_turns(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout(),
        }
    }
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            general_secs: default_general_timeout(),
            composite_secs: default_composite_timeout(),
        }
    }
}

impl Default for ValidationTuning {
    fn default() -> Self {
        Self {
            contrast_sentence_gap: default_contrast_sentence_gap(),
        }
    }
}
