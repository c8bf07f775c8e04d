//! Curing-cycle grouping and scoring.
//!
//! Partitions work-orders by curing-cycle code and scores each resulting
//! group on quantity, size uniformity, and density, so the orchestrator and
//! the autoclave assigner can prioritize which cycles to batch first.

use std::collections::HashMap;

use autoclave_types::{CycleGroup, WorkOrder};
use tracing::debug;

/// Groups work orders by curing-cycle code, scores each group, and returns
/// the groups alongside a shortlist of recommended cycle codes.
#[must_use]
pub fn analyze(work_orders: &[WorkOrder]) -> (Vec<CycleGroup>, Vec<String>) {
    let mut order: Vec<String> = Vec::new();
    let mut by_cycle: HashMap<String, Vec<WorkOrder>> = HashMap::new();

    for wo in work_orders {
        if !by_cycle.contains_key(&wo.curing_cycle) {
            order.push(wo.curing_cycle.clone());
        }
        by_cycle
            .entry(wo.curing_cycle.clone())
            .or_default()
            .push(wo.clone());
    }

    let mut groups: Vec<CycleGroup> = order
        .into_iter()
        .map(|code| {
            let wos = by_cycle.remove(&code).unwrap_or_default();
            score_group(code, wos)
        })
        .collect();

    let recommended = recommended_codes(&groups);

    // Stable order by descending score for callers that want a prioritized
    // view; ties keep their original (insertion) relative order.
    groups.sort_by(|a, b| b.score.total_cmp(&a.score));

    debug!(
        cycle_count = groups.len(),
        recommended_count = recommended.len(),
        "cycle analysis complete"
    );

    (groups, recommended)
}

fn score_group(cycle_code: String, work_orders: Vec<WorkOrder>) -> CycleGroup {
    let n = work_orders.len();
    let areas: Vec<f64> = work_orders.iter().map(WorkOrder::total_area).collect();
    let aggregate_area: f64 = areas.iter().sum();

    let quantity = (1.0_f64).min(((n as f64) + 1.0).ln() / 20.0_f64.ln());

    let uniformity = if n > 1 {
        let mean = aggregate_area / n as f64;
        let variance = areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n as f64;
        let sigma = variance.sqrt();
        if mean > 0.0 {
            (1.0 - sigma / mean).max(0.0)
        } else {
            0.0
        }
    } else {
        0.8
    };

    let mean_area = if n > 0 { aggregate_area / n as f64 } else { 0.0 };
    let density = (1.0 - mean_area / 1e5).max(0.0);

    let score = round3(0.4 * quantity + 0.3 * uniformity + 0.3 * density);

    CycleGroup {
        cycle_code,
        work_orders,
        aggregate_area,
        score,
    }
}

/// Every cycle scoring above 0.6, in descending score order, topped up to at
/// least three entries if fewer qualify. When more than three cycles clear
/// the threshold, all of them are returned rather than truncating to three.
fn recommended_codes(groups: &[CycleGroup]) -> Vec<String> {
    let mut sorted: Vec<&CycleGroup> = groups.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut out: Vec<String> = sorted
        .iter()
        .filter(|g| g.score > 0.6)
        .map(|g| g.cycle_code.clone())
        .collect();

    if out.len() < 3 {
        for g in &sorted {
            if out.len() >= 3 {
                break;
            }
            if !out.contains(&g.cycle_code) {
                out.push(g.cycle_code.clone());
            }
        }
    }

    out
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
