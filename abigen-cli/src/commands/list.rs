//! `abigen-batch list` — show the contracts a run would process.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use super::RegistryArgs;

/// Arguments for `abigen-batch list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ContractRow {
    #[tabled(rename = "contract")]
    name: String,
    #[tabled(rename = "abi")]
    abi: String,
    #[tabled(rename = "output")]
    output: String,
}

impl ListArgs {
    pub fn run(self, source: &RegistryArgs) -> Result<ExitCode> {
        let registry = source.load()?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(registry.list())
                    .context("failed to serialize registry JSON")?
            );
            return Ok(ExitCode::SUCCESS);
        }

        if registry.is_empty() {
            println!("No contracts registered.");
            return Ok(ExitCode::SUCCESS);
        }

        let rows: Vec<ContractRow> = registry
            .list()
            .iter()
            .map(|c| ContractRow {
                name: c.name.to_string(),
                abi: c.abi.display().to_string(),
                output: c.output.display().to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("{} contracts", registry.len());
        Ok(ExitCode::SUCCESS)
    }
}
