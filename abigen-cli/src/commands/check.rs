//! `abigen-batch check` — validate the registry without launching anything.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use abigen_dispatch::CommandGenerator;

use super::RegistryArgs;

pub fn run(source: &RegistryArgs) -> Result<ExitCode> {
    let registry = source.load()?;
    registry.validate().context("invalid contract registry")?;

    let generator = CommandGenerator::new(registry.generator.clone());
    if let Some(dir) = &generator.spec().working_dir {
        println!("working directory: {}", dir.display());
    }
    for contract in registry.list() {
        let args: Vec<String> = generator
            .command_args(contract)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        println!(
            "{} {}: {} {}",
            "✓".green().bold(),
            contract.name,
            generator.spec().program,
            args.join(" ")
        );
    }
    println!("{} contracts ready", registry.len());
    Ok(ExitCode::SUCCESS)
}
