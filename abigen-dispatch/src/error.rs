//! Error types for abigen-dispatch.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// The generator process could not be started or awaited.
#[derive(Debug, Error)]
#[error("failed to run `{program}`: {source}")]
pub struct LaunchError {
    pub program: String,
    #[source]
    pub source: std::io::Error,
}

/// Why a single contract's generation did not succeed.
///
/// Recorded in that contract's [`TaskReport`](crate::TaskReport); never
/// propagated out of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskFailure {
    /// The generator binary could not be started (not found, permissions).
    #[error("launch failed: {message}")]
    Launch { message: String },

    /// The generator ran and exited non-zero, or was killed by a signal.
    #[error("generator exited with {}", exit_label(.code))]
    Generation { code: Option<i32> },

    /// Exit status was 0 but the output file is not there.
    #[error("generator reported success but did not write {}", .path.display())]
    MissingOutput { path: PathBuf },

    /// The run-wide timeout expired first; its process group was killed.
    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// Killed because a sibling failed under fail-fast.
    #[error("aborted after an earlier failure")]
    Aborted,
}

impl From<LaunchError> for TaskFailure {
    fn from(err: LaunchError) -> Self {
        TaskFailure::Launch {
            message: err.to_string(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Failures of the dispatcher itself, as opposed to a contract's generation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("generation task failed to complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failure_shows_exit_code() {
        let failure = TaskFailure::Generation { code: Some(3) };
        assert_eq!(failure.to_string(), "generator exited with status 3");
    }

    #[test]
    fn signal_exit_is_labelled() {
        let failure = TaskFailure::Generation { code: None };
        assert!(failure.to_string().contains("signal"));
    }

    #[test]
    fn launch_error_keeps_program_name() {
        let err = LaunchError {
            program: "abi-gen".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let failure = TaskFailure::from(err);
        assert!(failure.to_string().contains("`abi-gen`"), "got: {failure}");
    }

    #[test]
    fn report_json_uses_documented_field_names() {
        let timed_out = serde_json::to_value(TaskFailure::TimedOut { after_ms: 300 }).expect("json");
        assert_eq!(timed_out, serde_json::json!({ "kind": "timed_out", "after_ms": 300 }));

        let missing = TaskFailure::MissingOutput {
            path: PathBuf::from("/repo/metadata_abi.rs"),
        };
        let missing = serde_json::to_value(missing).expect("json");
        assert_eq!(missing["kind"], "missing_output");
        assert_eq!(missing["path"], "/repo/metadata_abi.rs");
    }
}
