//! Placement solver: packs a candidate set of tools into one autoclave.
//!
//! Exactly two strategies:
//! 1. [`heuristic::pack`]: a bottom-left-fill/skyline greedy packer, tried
//!    first because it is cheap and usually good enough.
//! 2. [`exact::pack`]: a `selen` constraint model, tried when the
//!    heuristic's efficiency falls below
//!    [`autoclave_types::ConstraintBundle::EXACT_ACCEPTANCE_THRESHOLD`] or the
//!    caller forces it. Kept only if it does at least as well as the
//!    heuristic.

mod exact;
mod heuristic;

use autoclave_types::{Autoclave, BatchLayout, ConstraintBundle, PlacementItem};
use tracing::{debug, info};

/// Which strategy ultimately produced a [`SolveOutcome`]'s layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    Heuristic,
    Exact,
    /// Neither strategy placed anything.
    None,
}

/// The result of one [`solve`] call.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub layout: Option<BatchLayout>,
    pub method: SolveMethod,
    /// True if the exact model was attempted and exhausted its wall-clock
    /// budget. Surfaced in `OptimizationMetrics::partial`, never as a fatal
    /// error.
    pub timed_out: bool,
}

/// Pack `items` into `autoclave` under `constraints`.
///
/// `batch_id` seeds the returned layout's id; the caller (the batch builder)
/// is expected to overwrite it with the batch's real id once one is minted.
#[must_use]
pub fn solve(
    batch_id: &str,
    items: &[PlacementItem],
    autoclave: &Autoclave,
    constraints: &ConstraintBundle,
    force_exact: bool,
) -> SolveOutcome {
    if items.is_empty() {
        debug!("solve called with no items; returning empty layout");
        return SolveOutcome {
            layout: None,
            method: SolveMethod::None,
            timed_out: false,
        };
    }

    let heuristic_layout = heuristic::pack(batch_id, items, autoclave, constraints);
    let heuristic_efficiency = heuristic_layout.as_ref().map_or(0.0, |l| l.efficiency);

    let should_try_exact = force_exact
        || heuristic_layout.is_none()
        || heuristic_efficiency < ConstraintBundle::EXACT_ACCEPTANCE_THRESHOLD;

    if !should_try_exact {
        return SolveOutcome {
            layout: heuristic_layout,
            method: SolveMethod::Heuristic,
            timed_out: false,
        };
    }

    let (exact_layout, timed_out) = exact::pack(batch_id, items, autoclave, constraints);
    let exact_is_better = exact_layout
        .as_ref()
        .is_some_and(|e| heuristic_layout.as_ref().map_or(true, |h| e.efficiency >= h.efficiency));

    if exact_is_better {
        let efficiency = exact_layout.as_ref().map(|l| l.efficiency);
        info!(batch_id, ?efficiency, timed_out, "exact model accepted");
        SolveOutcome {
            layout: exact_layout,
            method: SolveMethod::Exact,
            timed_out,
        }
    } else if heuristic_layout.is_some() {
        SolveOutcome {
            layout: heuristic_layout,
            method: SolveMethod::Heuristic,
            timed_out,
        }
    } else {
        SolveOutcome {
            layout: None,
            method: SolveMethod::None,
            timed_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoclave_types::PlacementItem;

    fn autoclave(w: f64, h: f64) -> Autoclave {
        Autoclave {
            id: "A1".into(),
            code: "A1".into(),
            width: w,
            length: h,
            vacuum_capacity: 4,
            max_weight: None,
        }
    }

    fn item(wo: &str, tool: &str, w: f64, h: f64) -> PlacementItem {
        PlacementItem {
            wo_id: wo.into(),
            tool_id: tool.into(),
            width: w,
            height: h,
            vacuum_demand: 1,
            elevated: false,
        }
    }

    #[test]
    fn empty_items_produce_no_layout() {
        let outcome = solve("B1", &[], &autoclave(2000.0, 1500.0), &ConstraintBundle::default(), false);
        assert!(outcome.layout.is_none());
        assert_eq!(outcome.method, SolveMethod::None);
    }

    #[test]
    fn a_single_small_item_packs_cleanly() {
        let items = vec![item("WO1", "T1", 400.0, 300.0)];
        let outcome = solve(
            "B1",
            &items,
            &autoclave(2000.0, 1500.0),
            &ConstraintBundle::default(),
            false,
        );
        let layout = outcome.layout.expect("expected a layout");
        assert_eq!(layout.placements.len(), 1);
        assert!(layout.efficiency > 0.0);
    }

    #[test]
    fn oversized_item_is_left_unplaced() {
        let items = vec![item("WO1", "T1", 5000.0, 5000.0)];
        let outcome = solve(
            "B1",
            &items,
            &autoclave(2000.0, 1500.0),
            &ConstraintBundle::default(),
            false,
        );
        assert!(outcome.layout.is_none() || outcome.layout.unwrap().placements.is_empty());
    }

    #[test]
    fn four_identical_600x400_tools_pack_at_known_efficiency() {
        let items: Vec<_> = (0..4).map(|i| item("WO", &format!("T{i}"), 600.0, 400.0)).collect();
        let bundle = ConstraintBundle {
            solver_time_cap_secs: 5.0,
            ..ConstraintBundle::default()
        };
        let outcome = solve("B1", &items, &autoclave(2000.0, 1500.0), &bundle, false);
        let layout = outcome.layout.expect("expected a layout");
        assert_eq!(layout.placements.len(), 4);
        assert_eq!(layout.efficiency, 0.320);
    }

    #[test]
    fn single_large_tool_lands_at_the_corner_margin() {
        let items = vec![PlacementItem {
            wo_id: "WO1".into(),
            tool_id: "T1".into(),
            width: 1800.0,
            height: 1400.0,
            vacuum_demand: 4,
            elevated: false,
        }];
        let outcome = solve(
            "B1",
            &items,
            &autoclave(2000.0, 1500.0),
            &ConstraintBundle::default(),
            false,
        );
        let layout = outcome.layout.expect("expected a layout");
        assert_eq!(layout.placements.len(), 1);
        assert_eq!(layout.placements[0].x, 20.0);
        assert_eq!(layout.placements[0].y, 20.0);
        assert_eq!(layout.efficiency, 0.840);
    }
}
