//! Domain types for the contract registry.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The name of a contract, passed verbatim to the generator as a naming hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractName(pub String);

impl ContractName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ContractName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContractName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One contract to generate bindings for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractDescriptor {
    pub name: ContractName,
    /// JSON ABI description read by the generator.
    pub abi: PathBuf,
    /// Where the generator writes the bindings.
    pub output: PathBuf,
}

impl ContractDescriptor {
    pub fn new(
        name: impl Into<ContractName>,
        abi: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            abi: abi.into(),
            output: output.into(),
        }
    }
}

/// How the external generator is launched.
///
/// The final command line is `<program> <args..> -c <name> -j <abi> -o <output>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Default for GeneratorSpec {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            args: vec!["run".to_string(), "--".to_string()],
            working_dir: None,
        }
    }
}

/// Ordered set of contracts plus the generator that processes them.
///
/// Fixed for the duration of a run; nothing here is ever written back to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Registry {
    #[serde(default)]
    pub generator: GeneratorSpec,
    #[serde(default)]
    pub contracts: Vec<ContractDescriptor>,
}

impl Registry {
    /// Descriptors in registry order.
    pub fn list(&self) -> &[ContractDescriptor] {
        &self.contracts
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn get(&self, name: &ContractName) -> Option<&ContractDescriptor> {
        self.contracts.iter().find(|c| &c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
