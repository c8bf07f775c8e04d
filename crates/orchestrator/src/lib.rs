//! Orchestrator: the single entry point tying the pipeline together. Checks
//! work orders against the lock collaborator before optimization begins,
//! runs cycle analysis, elevation selection, autoclave assignment, and the
//! batch builder, then audits the result's internal consistency before
//! returning it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use autoclave_batching::build_batches;
use autoclave_geometry::{fits_in_autoclave, overlap_with_gap, rotated_dims, BBox};
use autoclave_lock::LockRegistry;
use autoclave_types::{
    Autoclave, AutoclaveError, BatchLayout, BatchSummary, ConstraintBundle, CycleAssignment,
    CycleGroup, ExecuteOutcome, OptimizationMetrics, WorkOrder,
};
use tracing::{info, warn};
use uuid::Uuid;

/// The result of an `analyze()` call.
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub cycle_groups: Vec<CycleGroup>,
    pub recommended_codes: Vec<String>,
    pub suggested_cycle_to_autoclave: HashMap<String, String>,
    pub assignments: Vec<CycleAssignment>,
}

/// The full input envelope of an `execute()` call.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub work_orders: Vec<WorkOrder>,
    pub autoclaves: Vec<Autoclave>,
    /// Cycle codes to actually batch; empty means "every cycle present".
    pub selected_cycles: Vec<String>,
    /// Caller-supplied elevation map; `None` triggers `select_elevated` with
    /// `constraints.elevation_cap`.
    pub elevated_tool_ids: Option<HashMap<String, Vec<String>>>,
    /// Caller-supplied cycle→autoclave map; `None` triggers `assign`.
    pub cycle_to_autoclave: Option<HashMap<String, String>>,
    pub constraints: ConstraintBundle,
}

pub struct Orchestrator {
    lock_registry: Arc<dyn LockRegistry>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(lock_registry: Arc<dyn LockRegistry>) -> Self {
        Self { lock_registry }
    }

    /// Groups work orders into cycles, scores them, and suggests an
    /// autoclave assignment. Read-only: touches no collaborator.
    #[must_use]
    pub fn analyze(&self, work_orders: &[WorkOrder], autoclaves: &[Autoclave]) -> AnalyzeOutcome {
        let (cycle_groups, recommended_codes) = autoclave_cycles::analyze(work_orders);
        let (suggested_cycle_to_autoclave, assignments) =
            autoclave_assigner::assign(&cycle_groups, autoclaves);

        AnalyzeOutcome {
            cycle_groups,
            recommended_codes,
            suggested_cycle_to_autoclave,
            assignments,
        }
    }

    /// Runs the full pipeline and returns ordered batches plus aggregate
    /// metrics, or a rejection.
    #[must_use]
    pub fn execute(&self, request: ExecuteRequest) -> ExecuteOutcome {
        let ExecuteRequest {
            work_orders,
            autoclaves,
            selected_cycles,
            elevated_tool_ids,
            cycle_to_autoclave,
            constraints,
        } = request;

        if work_orders.is_empty() {
            info!("execute called with no work orders");
            return ExecuteOutcome::Success {
                batches: Vec::new(),
                metrics: OptimizationMetrics::default(),
            };
        }

        if let Err(errors) = validate_input(&work_orders, &autoclaves, constraints.beta) {
            return ExecuteOutcome::Rejected { errors };
        }

        let wo_ids: Vec<String> = work_orders.iter().map(|wo| wo.id.clone()).collect();
        let report = self.lock_registry.validate(&wo_ids);
        for warning in &report.warnings {
            warn!(%warning);
        }
        if !report.errors.is_empty() {
            return ExecuteOutcome::Rejected {
                errors: report.errors,
            };
        }

        let valid_ids: HashSet<&str> = report.valid_ids.iter().map(String::as_str).collect();
        let active_wos: Vec<WorkOrder> = work_orders
            .into_iter()
            .filter(|wo| valid_ids.contains(wo.id.as_str()))
            .collect();

        let (mut cycle_groups, _) = autoclave_cycles::analyze(&active_wos);
        if !selected_cycles.is_empty() {
            let selected: HashSet<&str> = selected_cycles.iter().map(String::as_str).collect();
            cycle_groups.retain(|g| selected.contains(g.cycle_code.as_str()));
        }

        let elevated_map = elevated_tool_ids.unwrap_or_else(|| {
            let (map, pct) = autoclave_elevation::select_elevated(&active_wos, constraints.elevation_cap);
            info!(elevated_pct = pct, "elevation selection run by orchestrator default");
            map
        });

        let (assigned_map, assignment_list) = match cycle_to_autoclave {
            Some(map) => (map, Vec::new()),
            None => autoclave_assigner::assign(&cycle_groups, &autoclaves),
        };
        let autoclaves_by_id: HashMap<&str, &Autoclave> =
            autoclaves.iter().map(|a| (a.id.as_str(), a)).collect();

        let mut batches: Vec<BatchLayout> = Vec::new();
        let mut batch_wo_ids: Vec<Vec<String>> = Vec::new();
        let mut batch_autoclave_ids: Vec<String> = Vec::new();
        let mut unplaced_wo_count = 0usize;
        let mut any_timed_out = false;
        let cycles_processed = cycle_groups.len();

        for group in &cycle_groups {
            let Some(autoclave_id) = assigned_map.get(&group.cycle_code) else {
                warn!(cycle = %group.cycle_code, "no autoclave assignment for cycle; skipping");
                unplaced_wo_count += group.work_orders.len();
                continue;
            };
            let Some(&autoclave) = autoclaves_by_id.get(autoclave_id.as_str()) else {
                warn!(cycle = %group.cycle_code, autoclave_id = %autoclave_id, "assigned autoclave not found; skipping");
                unplaced_wo_count += group.work_orders.len();
                continue;
            };

            let elevated_submap: HashMap<String, Vec<String>> = group
                .work_orders
                .iter()
                .filter_map(|wo| elevated_map.get(&wo.id).map(|ids| (wo.id.clone(), ids.clone())))
                .collect();

            let outcome = build_batches(&group.work_orders, autoclave, &elevated_submap, &constraints);
            unplaced_wo_count += outcome.unplaced_wo_ids.len();

            for batch in outcome.batches {
                any_timed_out |= batch.timed_out;
                batches.push(batch.layout);
                batch_wo_ids.push(batch.wo_ids);
                batch_autoclave_ids.push(autoclave.id.clone());
            }
        }

        for layout in &mut batches {
            layout.id = Uuid::new_v4().to_string();
        }

        if let Some(error) = audit_invariants(&batches, &constraints, &autoclaves_by_id, &batch_autoclave_ids) {
            return ExecuteOutcome::Rejected { errors: vec![error] };
        }

        let mut order: Vec<usize> = (0..batches.len()).collect();
        order.sort_by(|&a, &b| batches[b].efficiency.total_cmp(&batches[a].efficiency));
        let batches: Vec<BatchLayout> = order.iter().map(|&i| batches[i].clone()).collect();
        let batch_wo_ids: Vec<Vec<String>> = order.iter().map(|&i| batch_wo_ids[i].clone()).collect();
        let batch_autoclave_ids: Vec<String> = order.iter().map(|&i| batch_autoclave_ids[i].clone()).collect();

        for ((layout, ids), autoclave_id) in batches.iter().zip(&batch_wo_ids).zip(&batch_autoclave_ids) {
            self.lock_registry.register_batch(&layout.id, ids, autoclave_id);
        }

        let wo_count_placed: usize = batch_wo_ids.iter().map(Vec::len).sum();
        let batch_summaries: Vec<BatchSummary> = batches
            .iter()
            .zip(&batch_wo_ids)
            .map(|(layout, ids)| BatchSummary {
                id: layout.id.clone(),
                efficiency: layout.efficiency,
                wo_count: ids.len(),
                is_recommended: layout.efficiency >= 0.7,
            })
            .collect();

        let metrics = OptimizationMetrics {
            wo_count_in: wo_ids.len(),
            wo_count_placed,
            cycles_processed,
            batches_produced: batches.len(),
            partial: any_timed_out || unplaced_wo_count > 0,
            batch_summaries,
            assignment_rationale: assignment_list.into_iter().map(|a| a.reason).collect(),
        };

        info!(
            batches = metrics.batches_produced,
            placed = metrics.wo_count_placed,
            unplaced = unplaced_wo_count,
            "execute complete"
        );

        if unplaced_wo_count > 0 {
            ExecuteOutcome::SuccessPartial {
                batches,
                metrics,
                unplaced_wo_count,
            }
        } else {
            ExecuteOutcome::Success { batches, metrics }
        }
    }
}

fn validate_input(
    work_orders: &[WorkOrder],
    autoclaves: &[Autoclave],
    beta: f64,
) -> Result<(), Vec<AutoclaveError>> {
    let mut errors = Vec::new();

    if autoclaves.is_empty() {
        errors.push(AutoclaveError::InputInvalid("no autoclaves supplied".to_string()));
    }
    for autoclave in autoclaves {
        if autoclave.width <= 0.0 || autoclave.length <= 0.0 {
            errors.push(AutoclaveError::InputInvalid(format!(
                "autoclave {} has non-positive dimensions",
                autoclave.id
            )));
        }
        if autoclave.vacuum_capacity == 0 {
            errors.push(AutoclaveError::InputInvalid(format!(
                "autoclave {} has zero vacuum capacity",
                autoclave.id
            )));
        }
    }

    for wo in work_orders {
        if wo.vacuum_demand == 0 {
            errors.push(AutoclaveError::InputInvalid(format!(
                "work order {} has zero vacuum demand",
                wo.id
            )));
        }
        for tool in &wo.tools {
            if tool.width <= 0.0 || tool.height <= 0.0 {
                errors.push(AutoclaveError::InputInvalid(format!(
                    "tool {} on work order {} has non-positive dimensions",
                    tool.id, wo.id
                )));
            }
        }

        if let Some(largest) = wo.largest_tool() {
            let fits_somewhere = autoclaves.iter().any(|autoclave| {
                [false, true].into_iter().any(|rotated| {
                    let (w, h) = rotated_dims(largest.width, largest.height, rotated);
                    w > 0.0
                        && h > 0.0
                        && w <= autoclave.width - 2.0 * beta
                        && h <= autoclave.length - 2.0 * beta
                })
            });
            if !fits_somewhere {
                errors.push(AutoclaveError::InputInvalid(format!(
                    "work order {}'s largest tool cannot fit any autoclave",
                    wo.id
                )));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Final consistency audit before returning to the caller: every placement
/// stays inside its autoclave's border margin, no placement is duplicated
/// across batches, no two same-level placements in a batch overlap, and
/// each batch's reported efficiency matches its placements.
fn audit_invariants(
    batches: &[BatchLayout],
    constraints: &ConstraintBundle,
    autoclaves_by_id: &HashMap<&str, &Autoclave>,
    batch_autoclave_ids: &[String],
) -> Option<AutoclaveError> {
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for (layout, autoclave_id) in batches.iter().zip(batch_autoclave_ids) {
        let Some(&autoclave) = autoclaves_by_id.get(autoclave_id.as_str()) else {
            return Some(AutoclaveError::InternalInvariant(format!(
                "batch references unknown autoclave {autoclave_id}"
            )));
        };

        for placement in &layout.placements {
            let b = BBox::new(placement.x, placement.y, placement.w, placement.h);
            if !fits_in_autoclave(b, autoclave, constraints.beta) {
                return Some(AutoclaveError::InternalInvariant(format!(
                    "placement of {} in batch {} lies outside the border margin",
                    placement.tool_id, layout.id
                )));
            }

            let pair = (placement.wo_id.clone(), placement.tool_id.clone());
            if !seen_pairs.insert(pair) {
                return Some(AutoclaveError::InternalInvariant(format!(
                    "({}, {}) appears in more than one batch",
                    placement.wo_id, placement.tool_id
                )));
            }
        }

        for (i, p) in layout.placements.iter().enumerate() {
            for q in &layout.placements[i + 1..] {
                if p.level != q.level {
                    continue;
                }
                let box_p = BBox::new(p.x, p.y, p.w, p.h);
                let box_q = BBox::new(q.x, q.y, q.w, q.h);
                if overlap_with_gap(box_p, box_q, constraints.gamma) {
                    return Some(AutoclaveError::InternalInvariant(format!(
                        "placements in batch {} overlap", layout.id
                    )));
                }
            }
        }

        let expected_efficiency = round3(
            layout.placements.iter().map(|p| p.w * p.h).sum::<f64>() / autoclave.area(),
        );
        if (expected_efficiency - layout.efficiency).abs() > 1e-9 {
            return Some(AutoclaveError::InternalInvariant(format!(
                "batch {} reports efficiency {} but computed {}",
                layout.id, layout.efficiency, expected_efficiency
            )));
        }
    }

    None
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
