pub mod check;
pub mod generate;
pub mod list;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use abigen_core::{registry, Registry};

/// Where the registry comes from and how paths in it are resolved.
#[derive(Args, Debug, Default)]
pub struct RegistryArgs {
    /// YAML registry to use instead of the built-in contract list.
    #[arg(long, global = true, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Base directory for relative paths. Defaults to the registry file's
    /// directory, or the current directory for the built-in registry.
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Generator program, overriding the registry's.
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub generator: Option<String>,

    /// Leading generator argument (repeatable), replacing the registry's.
    #[arg(long = "generator-arg", global = true, value_name = "ARG", allow_hyphen_values = true)]
    pub generator_args: Vec<String>,
}

impl RegistryArgs {
    /// Load, apply generator overrides, and resolve relative paths.
    /// Does not validate.
    pub fn load(&self) -> Result<Registry> {
        let (mut reg, default_root) = match &self.registry {
            Some(path) => {
                let reg = registry::load_at(path)
                    .with_context(|| format!("cannot load registry '{}'", path.display()))?;
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(PathBuf::from);
                (reg, dir)
            }
            None => (registry::builtin().context("built-in registry is malformed")?, None),
        };

        if let Some(program) = &self.generator {
            reg.generator.program = program.clone();
        }
        if !self.generator_args.is_empty() {
            reg.generator.args = self.generator_args.clone();
        }

        // Absolute, so paths stay valid inside the generator's working_dir.
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let root = match self.root.clone().or(default_root) {
            Some(root) => cwd.join(root),
            None => cwd,
        };
        tracing::debug!(root = %root.display(), contracts = reg.len(), "registry loaded");
        Ok(reg.resolve(&root))
    }
}
