//! Error types for abigen-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ContractName;

/// A registry that cannot be dispatched.
///
/// Always raised before any generator process is started.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Underlying I/O failure while reading a registry file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML parse error for an in-memory registry (the built-in one, or a string).
    #[error("failed to parse registry: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("registry contains no contracts")]
    Empty,

    #[error("contract #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("contract '{name}' is registered more than once")]
    DuplicateName { name: ContractName },

    #[error("ABI input for '{name}' not found at {path}")]
    MissingAbi { name: ContractName, path: PathBuf },

    #[error("contract '{name}' uses {path} as both ABI input and output")]
    OutputIsInput { name: ContractName, path: PathBuf },

    #[error("contracts '{first}' and '{second}' both write {path}")]
    DuplicateOutput {
        first: ContractName,
        second: ContractName,
        path: PathBuf,
    },

    #[error("contract '{writer}' writes {path}, the ABI input of '{reader}'")]
    OutputOverwritesInput {
        writer: ContractName,
        reader: ContractName,
        path: PathBuf,
    },

    #[error("output directory for '{name}' does not exist: {path}")]
    MissingOutputDir { name: ContractName, path: PathBuf },

    #[error("generator program is empty")]
    EmptyGenerator,

    #[error("generator working directory does not exist: {path}")]
    MissingWorkingDir { path: PathBuf },

    #[error("unknown contract '{name}'; registered: {known}")]
    UnknownContract { name: ContractName, known: String },
}
