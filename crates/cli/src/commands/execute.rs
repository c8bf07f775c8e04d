//! `execute` - run the full batching pipeline and report the result.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use autoclave_lock::InMemoryLockRegistry;
use autoclave_orchestrator::{ExecuteRequest, Orchestrator};
use autoclave_types::{ExecuteOutcome, OptimizationMetrics};
use clap::Args;

use crate::scenario::ScenarioFile;

#[derive(Args)]
pub struct ExecuteCommand {
    /// Path to a JSON scenario file (work orders + autoclaves)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Restrict the run to these curing-cycle codes (repeatable, or comma
    /// separated); overrides the scenario file's `selected_cycles`. Omit to
    /// batch every cycle present.
    #[arg(long, value_delimiter = ',')]
    cycles: Vec<String>,

    /// Override the border margin (mm) from the scenario's constraints block
    #[arg(long)]
    beta: Option<f64>,

    /// Override the clearance (mm) from the scenario's constraints block
    #[arg(long)]
    gamma: Option<f64>,

    /// Disable rotation, overriding the scenario's constraints block
    #[arg(long)]
    no_rotation: bool,

    /// Write the resulting batches as JSON to this path instead of only
    /// printing a summary
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExecuteCommand {
    pub fn execute(self) -> Result<()> {
        let raw = std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        let scenario: ScenarioFile =
            serde_json::from_str(&raw).context("failed to parse scenario file")?;
        let mut constraints = scenario.constraints();
        if let Some(beta) = self.beta {
            constraints.beta = beta;
        }
        if let Some(gamma) = self.gamma {
            constraints.gamma = gamma;
        }
        if self.no_rotation {
            constraints.allow_rotation = false;
        }

        let selected_cycles = if self.cycles.is_empty() {
            scenario.selected_cycles
        } else {
            self.cycles
        };

        let orchestrator = Orchestrator::new(Arc::new(InMemoryLockRegistry::new()));
        let request = ExecuteRequest {
            work_orders: scenario.work_orders,
            autoclaves: scenario.autoclaves,
            selected_cycles,
            elevated_tool_ids: scenario.elevated_tool_ids,
            cycle_to_autoclave: scenario.cycle_to_autoclave,
            constraints,
        };

        let outcome = orchestrator.execute(request);

        match &outcome {
            ExecuteOutcome::Success { metrics, .. } => {
                print_summary(metrics, 0);
            }
            ExecuteOutcome::SuccessPartial {
                metrics,
                unplaced_wo_count,
                ..
            } => {
                print_summary(metrics, *unplaced_wo_count);
            }
            ExecuteOutcome::Rejected { errors } => {
                eprintln!("rejected:");
                for error in errors {
                    eprintln!("  - {error}");
                }
                anyhow::bail!("run rejected: {} error(s)", errors.len());
            }
        }

        if let Some(path) = self.output {
            let json = serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?;
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }

        Ok(())
    }
}

fn print_summary(metrics: &OptimizationMetrics, unplaced_wo_count: usize) {
    println!(
        "{} work orders in, {} placed, {} batches across {} cycles{}",
        metrics.wo_count_in,
        metrics.wo_count_placed,
        metrics.batches_produced,
        metrics.cycles_processed,
        if metrics.partial { " (partial)" } else { "" }
    );
    if unplaced_wo_count > 0 {
        println!("{unplaced_wo_count} work orders could not be placed");
    }
    println!();
    println!("{:<38} {:>10} {:>9} {:>12}", "BATCH", "EFFICIENCY", "WO COUNT", "RECOMMENDED");
    for batch in &metrics.batch_summaries {
        println!(
            "{:<38} {:>10.3} {:>9} {:>12}",
            batch.id,
            batch.efficiency,
            batch.wo_count,
            if batch.is_recommended { "yes" } else { "" }
        );
    }
}
