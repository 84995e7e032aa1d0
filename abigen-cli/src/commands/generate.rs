//! `abigen-batch generate` — run the generator for each contract and report.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use abigen_core::{ContractName, Registry};
use abigen_dispatch::{
    CommandGenerator, DispatchOptions, Dispatcher, RunReport, TaskFailure, TaskReport,
};

use super::RegistryArgs;

/// Arguments for `abigen-batch generate`.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Only generate this contract (repeatable).
    #[arg(long = "contract", short = 'c', value_name = "NAME")]
    pub contracts: Vec<String>,

    /// Kill generators still running after this many seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Stop the remaining generators as soon as one fails.
    #[arg(long)]
    pub fail_fast: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn run(self, source: &RegistryArgs) -> Result<ExitCode> {
        let names: Vec<ContractName> =
            self.contracts.iter().cloned().map(ContractName::from).collect();
        let registry = source.load()?.select(&names)?;
        registry.validate().context("invalid contract registry")?;

        let options = DispatchOptions {
            timeout: self.timeout.map(Duration::from_secs),
            fail_fast: self.fail_fast,
        };
        let dispatcher = Dispatcher::new(CommandGenerator::new(registry.generator.clone()), options);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        // Generators run in their own process groups, so a terminal Ctrl-C
        // reaches only us; dropping the run kills them.
        let report = runtime.block_on(async {
            tokio::select! {
                report = dispatcher.run(&registry) => report.map(Some),
                _ = tokio::signal::ctrl_c() => Ok(None),
            }
        });
        let Some(report) = report.context("generation run failed")? else {
            drop(runtime);
            bail!("interrupted; running generators were stopped");
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report JSON")?
            );
        } else {
            print_report(&registry, &report);
        }

        Ok(if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "contract")]
    contract: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "time")]
    time: String,
    #[tabled(rename = "output")]
    output: String,
}

fn print_report(registry: &Registry, report: &RunReport) {
    let rows: Vec<ReportRow> = registry
        .list()
        .iter()
        .zip(&report.tasks)
        .map(|(contract, task)| ReportRow {
            contract: task.name.to_string(),
            status: status_label(task),
            time: format!("{} ms", task.duration_ms),
            output: contract.output.display().to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for task in report.failed() {
        let reason = task.failure().map(ToString::to_string).unwrap_or_default();
        println!("{} {}: {}", "✗".red().bold(), task.name.to_string().bold(), reason);
        for line in task.diagnostics().lines() {
            println!("    {line}");
        }
    }

    let total = report.tasks.len();
    let ok = report.succeeded().count();
    let summary = format!("{ok}/{total} contracts generated");
    if report.is_success() {
        println!("{} {summary}", "✓".green().bold());
    } else {
        println!("{} {summary}, {} failed", "✗".red().bold(), total - ok);
    }
}

fn status_label(task: &TaskReport) -> String {
    match task.failure() {
        None => "✓ ok".green().to_string(),
        Some(failure) => format!("✗ {}", failure_key(failure)).red().to_string(),
    }
}

fn failure_key(failure: &TaskFailure) -> &'static str {
    match failure {
        TaskFailure::Launch { .. } => "launch error",
        TaskFailure::Generation { .. } => "failed",
        TaskFailure::MissingOutput { .. } => "no output",
        TaskFailure::TimedOut { .. } => "timed out",
        TaskFailure::Aborted => "aborted",
    }
}
