//! Per-contract results and the run summary.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use abigen_core::ContractName;

use crate::error::TaskFailure;

/// Whether a contract's bindings were generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Succeeded,
    Failed(TaskFailure),
}

/// Result of one contract's generation, attributed by name.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub name: ContractName,
    pub outcome: TaskOutcome,
    pub duration_ms: u64,
    /// SHA-256 of the output file, set only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_sha256: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl TaskReport {
    pub(crate) fn failed(name: ContractName, failure: TaskFailure, duration_ms: u64) -> Self {
        Self {
            name,
            outcome: TaskOutcome::Failed(failure),
            duration_ms,
            output_sha256: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Succeeded)
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match &self.outcome {
            TaskOutcome::Succeeded => None,
            TaskOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Captured text to show next to a failure: stderr, else stdout.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Every contract's result, in registry order regardless of completion order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| !t.is_success())
    }

    /// True only if every contract succeeded.
    pub fn is_success(&self) -> bool {
        self.tasks.iter().all(TaskReport::is_success)
    }

    pub fn get(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name.as_str() == name)
    }
}

/// Hex SHA-256 of a file's bytes.
pub(crate) async fn file_sha256(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let mut h = Sha256::new();
    h.update(&bytes);
    Ok(hex::encode(h.finalize()))
}
