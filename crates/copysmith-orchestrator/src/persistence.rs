//! Workflow-result persistence
//!
//! The revision loop records completed workflows best-effort: a store
//! failure is logged and never fails the workflow that produced the result,
//! but the write itself completes before the run returns so records are
//! not lost to runtime shutdown.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use copysmith_core::{Result, WorkflowResult};

/// Sink for completed workflow results
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn record_execution(&self, result: &WorkflowResult) -> Result<()>;
}

/// Discards everything; the default when no store is configured
pub struct NullStore;

#[async_trait]
impl ExecutionStore for NullStore {
    async fn record_execution(&self, _result: &WorkflowResult) -> Result<()> {
        Ok(())
    }
}

/// Appends one JSON line per completed workflow to a log file
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ExecutionStore for JsonlStore {
    async fn record_execution(&self, result: &WorkflowResult) -> Result<()> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}
