//! abigen core library — contract registry types, loading and validation.
//!
//! - [`types`] — [`ContractName`], [`ContractDescriptor`], [`GeneratorSpec`], [`Registry`]
//! - [`error`] — [`ConfigurationError`]
//! - [`registry`] — built-in registry, YAML loading, resolve / select / validate

pub mod error;
pub mod registry;
pub mod types;

pub use error::ConfigurationError;
pub use types::{ContractDescriptor, ContractName, GeneratorSpec, Registry};
