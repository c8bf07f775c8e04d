//! Multi-batch builder: repeatedly invokes the placement solver to turn one
//! (cycle, autoclave, elevated-map) triple into zero or more batches. The
//! caller is expected to have already grouped work-orders by curing cycle
//! and mapped that cycle to one autoclave; this crate enforces neither.

use std::collections::{HashMap, HashSet};

use autoclave_solver::solve;
use autoclave_types::{Autoclave, BatchLayout, ConstraintBundle, PlacementItem, WorkOrder};
use tracing::debug;

const RETAIN_HIGH_EFFICIENCY: f64 = 0.75;
const RETAIN_MODERATE_EFFICIENCY: f64 = 0.50;
const RETAIN_MODERATE_MIN_CANDIDATES: usize = 3;

/// One finalised batch plus the WO ids that contributed to it.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub layout: BatchLayout,
    pub wo_ids: Vec<String>,
    /// True if the solver attempt that produced this batch exhausted its
    /// wall-clock budget.
    pub timed_out: bool,
}

/// The full result of one [`build_batches`] call.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub batches: Vec<BatchResult>,
    /// WOs that could not be placed in any batch (e.g. too large, or vacuum
    /// demand exceeding the autoclave's capacity even alone).
    pub unplaced_wo_ids: Vec<String>,
}

/// Packs `work_orders` into as many batches as needed for one autoclave,
/// largest work order first.
#[must_use]
pub fn build_batches(
    work_orders: &[WorkOrder],
    autoclave: &Autoclave,
    elevated_tool_ids: &HashMap<String, Vec<String>>,
    constraints: &ConstraintBundle,
) -> BuildOutcome {
    let mut remaining: Vec<&WorkOrder> = work_orders.iter().collect();
    remaining.sort_by(|a, b| b.total_area().total_cmp(&a.total_area()));

    let mut outcome = BuildOutcome::default();

    while let Some(&largest_remaining) = remaining.first() {
        let mut candidate: Vec<&WorkOrder> = Vec::new();
        let mut retained_ids: Vec<String> = Vec::new();
        let mut last_good: Option<autoclave_solver::SolveOutcome> = None;

        for &wo in &remaining {
            candidate.push(wo);
            let candidate_len = candidate.len();
            let items = items_for(&candidate, elevated_tool_ids);
            let solved = solve(
                "candidate",
                &items,
                autoclave,
                constraints,
                false,
            );

            let accepted = match &solved.layout {
                Some(layout) => {
                    layout.efficiency >= RETAIN_HIGH_EFFICIENCY
                        || (layout.efficiency >= RETAIN_MODERATE_EFFICIENCY
                            && candidate_len >= RETAIN_MODERATE_MIN_CANDIDATES)
                }
                None => false,
            };

            if accepted {
                retained_ids.push(wo.id.clone());
                last_good = Some(solved);
            } else {
                candidate.pop();
            }
        }

        if retained_ids.is_empty() {
            debug!(
                wo_id = %largest_remaining.id,
                "nothing retained this pass; forcing a single-WO batch"
            );
            let items = items_for(&[largest_remaining], elevated_tool_ids);
            let solved = solve("candidate", &items, autoclave, constraints, false);
            let wo_id = largest_remaining.id.clone();
            remaining.retain(|wo| wo.id != wo_id);

            match solved.layout {
                Some(mut layout) => {
                    layout.total_weight = largest_remaining.total_weight();
                    outcome.batches.push(BatchResult {
                        layout,
                        wo_ids: vec![wo_id],
                        timed_out: solved.timed_out,
                    });
                }
                None => outcome.unplaced_wo_ids.push(wo_id),
            }
            continue;
        }

        let retained_set: HashSet<&str> = retained_ids.iter().map(String::as_str).collect();
        let total_weight: f64 = work_orders
            .iter()
            .filter(|wo| retained_set.contains(wo.id.as_str()))
            .map(WorkOrder::total_weight)
            .sum();
        remaining.retain(|wo| !retained_set.contains(wo.id.as_str()));

        let solved = last_good.expect("retained_ids non-empty implies a successful solve");
        let mut layout = solved.layout.expect("accepted outcome always carries a layout");
        layout.total_weight = total_weight;
        outcome.batches.push(BatchResult {
            layout,
            wo_ids: retained_ids,
            timed_out: solved.timed_out,
        });
    }

    outcome
}

fn items_for(
    work_orders: &[&WorkOrder],
    elevated_tool_ids: &HashMap<String, Vec<String>>,
) -> Vec<PlacementItem> {
    let mut items = Vec::new();
    for wo in work_orders {
        let elevated_for_wo = elevated_tool_ids.get(&wo.id);
        for tool in &wo.tools {
            let elevated = elevated_for_wo.is_some_and(|ids| ids.contains(&tool.id));
            items.push(PlacementItem {
                wo_id: wo.id.clone(),
                tool_id: tool.id.clone(),
                width: tool.width,
                height: tool.height,
                vacuum_demand: wo.vacuum_demand,
                elevated,
            });
        }
    }
    items
}
