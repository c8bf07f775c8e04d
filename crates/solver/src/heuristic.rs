//! Bottom-left-fill/skyline heuristic packer.
//!
//! Each level (floor, elevated) is packed independently against its own set
//! of already-placed boxes, since the non-overlap requirement only
//! constrains placements sharing a level.

use std::collections::HashSet;

use autoclave_geometry::{fits_in_autoclave, overlap_with_gap, rotated_dims, BBox};
use autoclave_types::{Autoclave, BatchLayout, ConstraintBundle, Placement, PlacementItem};
use tracing::debug;

const CELL: f64 = 50.0;

pub fn pack(
    batch_id: &str,
    items: &[PlacementItem],
    autoclave: &Autoclave,
    constraints: &ConstraintBundle,
) -> Option<BatchLayout> {
    let mut ordered: Vec<&PlacementItem> = items.iter().collect();
    ordered.sort_by(|a, b| b.area().total_cmp(&a.area()));

    let mut level0: Vec<BBox> = Vec::new();
    let mut level1: Vec<BBox> = Vec::new();
    let mut placements: Vec<Placement> = Vec::new();
    let mut contributing_wos: HashSet<&str> = HashSet::new();
    let mut vacuum_used: u32 = 0;

    for item in ordered {
        let level = u8::from(item.elevated);
        let placed_same_level = if level == 0 { &level0 } else { &level1 };

        let would_add_vacuum = !contributing_wos.contains(item.wo_id.as_str());
        if would_add_vacuum && vacuum_used + item.vacuum_demand > autoclave.vacuum_capacity {
            debug!(wo_id = %item.wo_id, tool_id = %item.tool_id, "rejected: vacuum capacity exhausted");
            continue;
        }

        let Some((x, y, w, h, rotated)) =
            best_position(item, placed_same_level, autoclave, constraints)
        else {
            debug!(wo_id = %item.wo_id, tool_id = %item.tool_id, "rejected: no feasible position");
            continue;
        };

        let placed_box = BBox::new(x, y, w, h);
        if level == 0 {
            level0.push(placed_box);
        } else {
            level1.push(placed_box);
        }

        if would_add_vacuum {
            vacuum_used += item.vacuum_demand;
            contributing_wos.insert(item.wo_id.as_str());
        }

        placements.push(Placement {
            wo_id: item.wo_id.clone(),
            tool_id: item.tool_id.clone(),
            x,
            y,
            w,
            h,
            rotated,
            level,
        });
    }

    if placements.is_empty() {
        return None;
    }

    let placed_area: f64 = placements.iter().map(Placement::area).sum();
    let efficiency = round3(placed_area / autoclave.area());

    Some(BatchLayout {
        id: batch_id.to_string(),
        autoclave_id: autoclave.id.clone(),
        placements,
        efficiency,
        total_weight: 0.0,
        vacuum_lines_used: vacuum_used,
    })
}

/// Try both rotations at every candidate anchor point, keeping the one with
/// the least waste: minimal x+y, tie-broken by uncovered cell count to its
/// lower-left.
fn best_position(
    item: &PlacementItem,
    placed: &[BBox],
    autoclave: &Autoclave,
    constraints: &ConstraintBundle,
) -> Option<(f64, f64, f64, f64, bool)> {
    let beta = constraints.beta;
    let gamma = constraints.gamma;

    let mut rotations = vec![false];
    if constraints.allow_rotation && (item.width - item.height).abs() > f64::EPSILON {
        rotations.push(true);
    }

    let mut candidates: Vec<(f64, f64)> = vec![(beta, beta)];
    for r in placed {
        candidates.push((r.right() + gamma, r.y));
        candidates.push((r.x, r.top() + gamma));
        candidates.push((r.right() + gamma, r.top() + gamma));
    }

    let mut best: Option<(f64, f64, f64, f64, bool, f64)> = None;

    for &(x, y) in &candidates {
        for &rotated in &rotations {
            let (w, h) = rotated_dims(item.width, item.height, rotated);
            let candidate = BBox::new(x, y, w, h);

            if !fits_in_autoclave(candidate, autoclave, beta) {
                continue;
            }
            if placed.iter().any(|r| overlap_with_gap(candidate, *r, gamma)) {
                continue;
            }

            let waste = x + y + 0.01 * empty_cells(beta, beta, x, y, placed) as f64;
            let better = match best {
                Some((_, _, _, _, _, best_waste)) => waste < best_waste,
                None => true,
            };
            if better {
                best = Some((x, y, w, h, rotated, waste));
            }
        }
    }

    best.map(|(x, y, w, h, rotated, _)| (x, y, w, h, rotated))
}

/// Count `CELL`x`CELL` cells in `[x0, x1) x [y0, y1)` not covered by any
/// already-placed box (sampled at cell centers).
fn empty_cells(x0: f64, y0: f64, x1: f64, y1: f64, placed: &[BBox]) -> usize {
    if x1 <= x0 || y1 <= y0 {
        return 0;
    }
    let mut count = 0usize;
    let mut cy = y0;
    while cy < y1 {
        let cy_mid = cy + CELL / 2.0;
        let mut cx = x0;
        while cx < x1 {
            let cx_mid = cx + CELL / 2.0;
            let covered = placed
                .iter()
                .any(|r| cx_mid >= r.x && cx_mid <= r.right() && cy_mid >= r.y && cy_mid <= r.top());
            if !covered {
                count += 1;
            }
            cx += CELL;
        }
        cy += CELL;
    }
    count
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
