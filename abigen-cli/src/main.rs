//! abigen-batch — regenerate contract ABI bindings with the external generator.
//!
//! # Usage
//!
//! ```text
//! abigen-batch [generate] [--contract <name>]... [--timeout <secs>] [--fail-fast] [--json]
//! abigen-batch list [--json]
//! abigen-batch check
//!
//! global: [--registry <file>] [--root <dir>] [--generator <program>] [--generator-arg <arg>]... [-v]
//! ```

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{generate::GenerateArgs, list::ListArgs, RegistryArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "abigen-batch",
    version,
    about = "Generate Rust bindings for every registered contract ABI",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    registry: RegistryArgs,

    /// Log dispatch progress to stderr (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the generator for every (or each selected) contract. The default.
    Generate(GenerateArgs),

    /// Print the contract registry without running anything.
    List(ListArgs),

    /// Validate the registry and show the generator command per contract.
    Check,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or_else(|| Commands::Generate(GenerateArgs::default())) {
        Commands::Generate(args) => args.run(&cli.registry),
        Commands::List(args) => args.run(&cli.registry),
        Commands::Check => commands::check::run(&cli.registry),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
