//! Autoclave assigner: maps each curing-cycle group to an autoclave by
//! size/count affinity.

use std::collections::HashMap;

use autoclave_types::{Autoclave, CycleAssignment, CycleGroup};
use tracing::debug;

/// Ranks cycle groups and autoclaves by priority/size and pairs them off one
/// to one. The caller may discard the map entirely and supply its own.
#[must_use]
pub fn assign(
    cycle_groups: &[CycleGroup],
    autoclaves: &[Autoclave],
) -> (HashMap<String, String>, Vec<CycleAssignment>) {
    if autoclaves.is_empty() {
        debug!("no autoclaves supplied; returning empty assignment");
        return (HashMap::new(), Vec::new());
    }

    let mut ranked_cycles: Vec<&CycleGroup> = cycle_groups.iter().collect();
    ranked_cycles.sort_by(|a, b| priority(b).total_cmp(&priority(a)));

    let mut ranked_autoclaves: Vec<&Autoclave> = autoclaves.iter().collect();
    ranked_autoclaves.sort_by(|a, b| b.area().total_cmp(&a.area()));
    let largest = ranked_autoclaves[0];

    let mut map = HashMap::new();
    let mut assignments = Vec::with_capacity(ranked_cycles.len());

    for (idx, cycle) in ranked_cycles.into_iter().enumerate() {
        let (autoclave, reason) = if idx < ranked_autoclaves.len() {
            let oven = ranked_autoclaves[idx];
            (
                oven,
                format!(
                    "rank {} by priority (area {:.0} mm^2, {} WOs) matched to rank {} by autoclave area ({} mm^2)",
                    idx + 1,
                    cycle.aggregate_area,
                    cycle.work_orders.len(),
                    idx + 1,
                    oven.area()
                ),
            )
        } else {
            (
                largest,
                format!(
                    "more cycles than autoclaves; overflow cycle shares the largest autoclave ({})",
                    largest.code
                ),
            )
        };

        map.insert(cycle.cycle_code.clone(), autoclave.id.clone());
        assignments.push(CycleAssignment {
            cycle_code: cycle.cycle_code.clone(),
            autoclave_id: autoclave.id.clone(),
            reason,
            wo_count: cycle.work_orders.len(),
            aggregate_area: cycle.aggregate_area,
        });
    }

    (map, assignments)
}

fn priority(group: &CycleGroup) -> f64 {
    0.6 * group.aggregate_area + 0.4 * 1000.0 * group.work_orders.len() as f64
}
