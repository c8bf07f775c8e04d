//! `analyze` - read-only cycle grouping and suggested autoclave assignment.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use autoclave_lock::InMemoryLockRegistry;
use autoclave_orchestrator::Orchestrator;
use clap::Args;

use crate::scenario::ScenarioFile;

#[derive(Args)]
pub struct AnalyzeCommand {
    /// Path to a JSON scenario file (work orders + autoclaves)
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

impl AnalyzeCommand {
    pub fn execute(self) -> Result<()> {
        let raw = std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        let scenario: ScenarioFile =
            serde_json::from_str(&raw).context("failed to parse scenario file")?;

        let orchestrator = Orchestrator::new(Arc::new(InMemoryLockRegistry::new()));
        let outcome = orchestrator.analyze(&scenario.work_orders, &scenario.autoclaves);

        println!(
            "{} work orders across {} curing cycles",
            scenario.work_orders.len(),
            outcome.cycle_groups.len()
        );
        println!();
        println!("{:<10} {:>6} {:>10} {:>14}", "CYCLE", "SCORE", "WO COUNT", "AREA (mm^2)");
        for group in &outcome.cycle_groups {
            println!(
                "{:<10} {:>6.3} {:>10} {:>14.0}",
                group.cycle_code,
                group.score,
                group.work_orders.len(),
                group.aggregate_area
            );
        }

        if !outcome.recommended_codes.is_empty() {
            println!();
            println!("recommended first: {}", outcome.recommended_codes.join(", "));
        }

        if !outcome.assignments.is_empty() {
            println!();
            println!("suggested assignment:");
            for assignment in &outcome.assignments {
                println!(
                    "  {} -> {} ({})",
                    assignment.cycle_code, assignment.autoclave_id, assignment.reason
                );
            }
        }

        Ok(())
    }
}
