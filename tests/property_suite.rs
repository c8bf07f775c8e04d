//! Quantified invariants P1-P8 and the determinism/round-trip properties
//! R1-R2, checked against `Orchestrator::execute` outputs directly rather
//! than relying solely on the orchestrator's own internal audit.

mod common;

use std::collections::{HashMap, HashSet};

use autoclave_geometry::{fits_in_autoclave, overlap_with_gap, BBox};
use autoclave_orchestrator::{ExecuteRequest, Orchestrator};
use autoclave_types::{Autoclave, BatchLayout, ConstraintBundle, ExecuteOutcome, WorkOrder};
use common::{autoclave, orchestrator, single_tool_wo};

fn mixed_scenario() -> (Vec<WorkOrder>, Vec<Autoclave>) {
    let work_orders = vec![
        single_tool_wo("WO1", "C", 900.0, 700.0, 1),
        single_tool_wo("WO2", "C", 500.0, 500.0, 1),
        single_tool_wo("WO3", "C", 700.0, 300.0, 1),
        single_tool_wo("WO4", "C", 300.0, 300.0, 1),
        single_tool_wo("WO5", "C", 400.0, 250.0, 1),
    ];
    let autoclaves = vec![autoclave("A1", 2000.0, 1500.0, 4)];
    (work_orders, autoclaves)
}

fn batches_from(work_orders: Vec<WorkOrder>, autoclaves: Vec<Autoclave>) -> Vec<BatchLayout> {
    let result = orchestrator().execute(ExecuteRequest {
        work_orders,
        autoclaves,
        selected_cycles: vec![],
        elevated_tool_ids: None,
        cycle_to_autoclave: None,
        constraints: ConstraintBundle::default(),
    });
    match result {
        ExecuteOutcome::Success { batches, .. } => batches,
        ExecuteOutcome::SuccessPartial { batches, .. } => batches,
        ExecuteOutcome::Rejected { errors } => panic!("unexpected rejection: {errors:?}"),
    }
}

#[test]
fn p1_through_p6_hold_on_every_returned_batch() {
    let (work_orders, autoclaves) = mixed_scenario();
    let beta = ConstraintBundle::default().beta;
    let gamma = ConstraintBundle::default().gamma;
    let autoclaves_by_id: HashMap<&str, &Autoclave> =
        autoclaves.iter().map(|a| (a.id.as_str(), a)).collect();
    let cycle_by_wo: HashMap<&str, &str> = work_orders
        .iter()
        .map(|wo| (wo.id.as_str(), wo.curing_cycle.as_str()))
        .collect();
    let vacuum_by_wo: HashMap<&str, u32> = work_orders
        .iter()
        .map(|wo| (wo.id.as_str(), wo.vacuum_demand))
        .collect();

    let batches = batches_from(work_orders.clone(), autoclaves.clone());
    assert!(!batches.is_empty());

    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for batch in &batches {
        let autoclave = autoclaves_by_id[batch.autoclave_id.as_str()];

        // P1: border margin.
        for p in &batch.placements {
            let b = BBox::new(p.x, p.y, p.w, p.h);
            assert!(fits_in_autoclave(b, autoclave, beta), "P1 violated by {p:?}");
        }

        // P2: same-level placements never overlap within gamma.
        for (i, p) in batch.placements.iter().enumerate() {
            for q in &batch.placements[i + 1..] {
                if p.level != q.level {
                    continue;
                }
                let bp = BBox::new(p.x, p.y, p.w, p.h);
                let bq = BBox::new(q.x, q.y, q.w, q.h);
                assert!(!overlap_with_gap(bp, bq, gamma), "P2 violated between {p:?} and {q:?}");
            }
        }

        // P3: vacuum-line sum across contributing WOs stays within capacity.
        let contributing: HashSet<&str> =
            batch.placements.iter().map(|p| p.wo_id.as_str()).collect();
        let vacuum_sum: u32 = contributing.iter().map(|id| vacuum_by_wo[id]).sum();
        assert!(vacuum_sum <= autoclave.vacuum_capacity, "P3 violated: {vacuum_sum}");

        // P4: each (WO, tool) pair appears in at most one batch this run.
        for p in &batch.placements {
            let pair = (p.wo_id.clone(), p.tool_id.clone());
            assert!(seen_pairs.insert(pair), "P4 violated: duplicate placement");
        }

        // P5: every placement in a batch shares one cycle code.
        let cycles: HashSet<&str> = batch
            .placements
            .iter()
            .map(|p| cycle_by_wo[p.wo_id.as_str()])
            .collect();
        assert_eq!(cycles.len(), 1, "P5 violated: batch mixes cycles");

        // P6: reported efficiency matches the computed occupied fraction.
        let occupied: f64 = batch.placements.iter().map(|p| p.w * p.h).sum();
        let expected = (occupied / autoclave.area() * 1000.0).round() / 1000.0;
        assert_eq!(batch.efficiency, expected, "P6 violated");
    }
}

/// P8: elevated placements per batch never exceed ceil(p * total placements)
/// for the default elevation cap.
#[test]
fn p8_elevation_cap_is_respected() {
    let work_orders: Vec<_> = (0..10)
        .map(|i| single_tool_wo(&format!("WO{i}"), "C", 200.0, 150.0, 1))
        .collect();
    let autoclaves = vec![autoclave("A1", 2000.0, 1500.0, 4)];
    let p = ConstraintBundle::default().elevation_cap;

    let batches = batches_from(work_orders, autoclaves);
    for batch in &batches {
        let total = batch.placements.len();
        let elevated = batch.placements.iter().filter(|pl| pl.level == 1).count();
        let cap = (p * total as f64).ceil() as usize;
        assert!(elevated <= cap, "P8 violated: {elevated} elevated out of {total}, cap {cap}");
    }
}

/// P7: two runs on byte-identical inputs produce identical placements,
/// efficiencies, and batch ordering (UUIDs excepted).
#[test]
fn p7_determinism_across_repeated_runs() {
    let (work_orders, autoclaves) = mixed_scenario();
    let first = batches_from(work_orders.clone(), autoclaves.clone());
    let second = batches_from(work_orders, autoclaves);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.efficiency, b.efficiency);
        assert_eq!(a.placements.len(), b.placements.len());
        assert_eq!(a.placements, b.placements);
    }
}

/// R1: feeding `execute` only the previously-placed work orders, pinned to
/// the previous run's cycle->autoclave assignments, reproduces the same
/// batch set (modulo batch ids).
#[test]
fn r1_rerun_on_previously_placed_wos_with_pinned_assignment_is_idempotent() {
    let (work_orders, autoclaves) = mixed_scenario();
    let cycle_by_wo: HashMap<&str, &str> = work_orders
        .iter()
        .map(|wo| (wo.id.as_str(), wo.curing_cycle.as_str()))
        .collect();

    let first = batches_from(work_orders.clone(), autoclaves.clone());
    assert!(!first.is_empty());

    let placed_wo_ids: HashSet<String> = first
        .iter()
        .flat_map(|b| b.placements.iter().map(|p| p.wo_id.clone()))
        .collect();
    let mut cycle_to_autoclave: HashMap<String, String> = HashMap::new();
    for batch in &first {
        if let Some(p) = batch.placements.first() {
            let cycle = cycle_by_wo[p.wo_id.as_str()].to_string();
            cycle_to_autoclave.insert(cycle, batch.autoclave_id.clone());
        }
    }

    let placed_work_orders: Vec<WorkOrder> = work_orders
        .into_iter()
        .filter(|wo| placed_wo_ids.contains(&wo.id))
        .collect();

    let second_result = Orchestrator::new(std::sync::Arc::new(
        autoclave_lock::InMemoryLockRegistry::new(),
    ))
    .execute(ExecuteRequest {
        work_orders: placed_work_orders,
        autoclaves,
        selected_cycles: vec![],
        elevated_tool_ids: None,
        cycle_to_autoclave: Some(cycle_to_autoclave),
        constraints: ConstraintBundle::default(),
    });
    let second = match second_result {
        ExecuteOutcome::Success { batches, .. } => batches,
        ExecuteOutcome::SuccessPartial { batches, .. } => batches,
        ExecuteOutcome::Rejected { errors } => panic!("unexpected rejection: {errors:?}"),
    };

    let mut first_pairs: Vec<(String, String)> = first
        .iter()
        .flat_map(|b| b.placements.iter().map(|p| (p.wo_id.clone(), p.tool_id.clone())))
        .collect();
    let mut second_pairs: Vec<(String, String)> = second
        .iter()
        .flat_map(|b| b.placements.iter().map(|p| (p.wo_id.clone(), p.tool_id.clone())))
        .collect();
    first_pairs.sort();
    second_pairs.sort();
    assert_eq!(first_pairs, second_pairs);

    let mut first_effs: Vec<f64> = first.iter().map(|b| b.efficiency).collect();
    let mut second_effs: Vec<f64> = second.iter().map(|b| b.efficiency).collect();
    first_effs.sort_by(f64::total_cmp);
    second_effs.sort_by(f64::total_cmp);
    assert_eq!(first_effs, second_effs);
}

/// R2: rotating the input work-order list leaves the batch set invariant
/// (same multiset of placements per autoclave, modulo batch ids and order).
#[test]
fn r2_rotating_input_order_leaves_batches_invariant() {
    let (work_orders, autoclaves) = mixed_scenario();

    let mut rotated = work_orders.clone();
    rotated.rotate_left(2);

    let original_batches = batches_from(work_orders, autoclaves.clone());
    let rotated_batches = batches_from(rotated, autoclaves);

    let mut original_pairs: Vec<(String, String)> = original_batches
        .iter()
        .flat_map(|b| b.placements.iter().map(|p| (p.wo_id.clone(), p.tool_id.clone())))
        .collect();
    let mut rotated_pairs: Vec<(String, String)> = rotated_batches
        .iter()
        .flat_map(|b| b.placements.iter().map(|p| (p.wo_id.clone(), p.tool_id.clone())))
        .collect();
    original_pairs.sort();
    rotated_pairs.sort();

    assert_eq!(original_pairs, rotated_pairs);

    let mut original_effs: Vec<f64> = original_batches.iter().map(|b| b.efficiency).collect();
    let mut rotated_effs: Vec<f64> = rotated_batches.iter().map(|b| b.efficiency).collect();
    original_effs.sort_by(f64::total_cmp);
    rotated_effs.sort_by(f64::total_cmp);
    assert_eq!(original_effs, rotated_effs);
}
