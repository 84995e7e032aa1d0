//! Registry loading, path resolution, selection and validation.
//!
//! # Lifecycle
//!
//! ```text
//! builtin() | load_at(file)      parse YAML
//!   -> resolve(root)             relative paths become root-relative
//!   -> select(names)             optional `--contract` subset
//!   -> validate()                fail before any process is spawned
//! ```
//!
//! A registry is read-only once built; there are no mutation operations.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;
use crate::types::{ContractName, Registry};

const BUILTIN_REGISTRY: &str = include_str!("../registry.yaml");

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// The registry shipped with the tool. Paths are relative to the repository root.
pub fn builtin() -> Result<Registry, ConfigurationError> {
    from_yaml_str(BUILTIN_REGISTRY)
}

/// Parse a registry from YAML text.
pub fn from_yaml_str(yaml: &str) -> Result<Registry, ConfigurationError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load a registry file.
///
/// Returns `ConfigurationError::Io` if unreadable,
/// `ConfigurationError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<Registry, ConfigurationError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigurationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// 2. Resolve / select / validate
// ---------------------------------------------------------------------------

impl Registry {
    /// Rebase every relative path (contract paths and the generator's
    /// working directory) onto `root`. Absolute paths are left alone.
    pub fn resolve(mut self, root: &Path) -> Self {
        for contract in &mut self.contracts {
            contract.abi = rebase(root, &contract.abi);
            contract.output = rebase(root, &contract.output);
        }
        if let Some(dir) = self.generator.working_dir.take() {
            self.generator.working_dir = Some(rebase(root, &dir));
        }
        self
    }

    /// Keep only the named contracts, preserving registry order.
    ///
    /// An empty `names` slice keeps everything.
    pub fn select(mut self, names: &[ContractName]) -> Result<Self, ConfigurationError> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            let known = self
                .contracts
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ConfigurationError::UnknownContract {
                name: unknown.clone(),
                known,
            });
        }
        self.contracts.retain(|c| names.contains(&c.name));
        Ok(self)
    }

    /// Check every invariant a dispatch relies on. Returns the first problem,
    /// in registry order.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.contracts.is_empty() {
            return Err(ConfigurationError::Empty);
        }
        if self.generator.program.trim().is_empty() {
            return Err(ConfigurationError::EmptyGenerator);
        }

        let mut names: HashSet<&ContractName> = HashSet::new();
        let mut outputs: HashMap<&Path, &ContractName> = HashMap::new();
        let inputs: HashMap<&Path, &ContractName> = self
            .contracts
            .iter()
            .map(|c| (c.abi.as_path(), &c.name))
            .collect();

        for (index, contract) in self.contracts.iter().enumerate() {
            if contract.name.0.trim().is_empty() {
                return Err(ConfigurationError::EmptyName { index });
            }
            if !names.insert(&contract.name) {
                return Err(ConfigurationError::DuplicateName {
                    name: contract.name.clone(),
                });
            }
            if contract.abi == contract.output {
                return Err(ConfigurationError::OutputIsInput {
                    name: contract.name.clone(),
                    path: contract.output.clone(),
                });
            }
            // own input is caught above, so any hit belongs to another contract
            if let Some(reader) = inputs.get(contract.output.as_path()) {
                return Err(ConfigurationError::OutputOverwritesInput {
                    writer: contract.name.clone(),
                    reader: (*reader).clone(),
                    path: contract.output.clone(),
                });
            }
            if let Some(first) = outputs.insert(contract.output.as_path(), &contract.name) {
                return Err(ConfigurationError::DuplicateOutput {
                    first: first.clone(),
                    second: contract.name.clone(),
                    path: contract.output.clone(),
                });
            }
            if !contract.abi.is_file() {
                return Err(ConfigurationError::MissingAbi {
                    name: contract.name.clone(),
                    path: contract.abi.clone(),
                });
            }
            match contract.output.parent() {
                Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
                    return Err(ConfigurationError::MissingOutputDir {
                        name: contract.name.clone(),
                        path: dir.to_path_buf(),
                    });
                }
                _ => {}
            }
        }

        if let Some(dir) = &self.generator.working_dir {
            if !dir.is_dir() {
                return Err(ConfigurationError::MissingWorkingDir { path: dir.clone() });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn rebase(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
