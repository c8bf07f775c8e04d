//! Autoclave Planner CLI - curing-batch analysis and optimization tool
//!
//! Command-line front end for the autoclave batching pipeline: reads a JSON
//! scenario file describing work orders and autoclaves, and either reports
//! cycle/assignment recommendations (`analyze`) or runs the full batching
//! pipeline and prints (or writes) the resulting batches (`execute`).

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod scenario;

use commands::analyze::AnalyzeCommand;
use commands::execute::ExecuteCommand;

#[derive(Parser)]
#[command(
    name = "autoclave-planner",
    version,
    about = "Curing-batch analysis and optimization for aerospace autoclaves",
    after_help = "EXAMPLES:\n  \
                  # Report cycle groupings and a suggested autoclave assignment\n  \
                  autoclave-planner analyze scenario.json\n\n  \
                  # Run the full pipeline and print the resulting batches\n  \
                  autoclave-planner execute scenario.json\n\n  \
                  # Run the full pipeline and write the batches to a file\n  \
                  autoclave-planner execute scenario.json --output batches.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read-only: cycle groups, recommended codes, suggested assignment
    Analyze(AnalyzeCommand),

    /// Run the full batching pipeline and report the resulting batches
    Execute(ExecuteCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    match cli.command {
        Commands::Analyze(cmd) => cmd.execute(),
        Commands::Execute(cmd) => cmd.execute(),
    }
}
