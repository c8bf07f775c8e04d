//! Exact placement model: a `selen` constraint-satisfaction formulation of
//! rectangle packing (integer coordinates, one rotation/selection boolean
//! per item, pairwise non-overlap as a 4-way disjunction, a linear
//! vacuum-capacity bound, maximize placed area).
//!
//! Coordinates and dimensions are millimetres rounded to the nearest integer;
//! `selen`'s integer domains can't represent the sub-millimetre fractions the
//! rest of the pipeline carries as `f64`, so this is the one place precision
//! is deliberately given up in exchange for a solver that can prove
//! optimality.

use std::collections::HashSet;

use autoclave_types::{Autoclave, BatchLayout, ConstraintBundle, Placement, PlacementItem};
use rayon::ThreadPoolBuilder;
use selen::prelude::*;
use tracing::warn;

struct ItemVars {
    x: VarId,
    y: VarId,
    r: VarId,
    s: VarId,
    w: VarId,
    h: VarId,
}

/// Returns `(layout, timed_out)`. `layout` is `None` if the model proved
/// infeasible, hit an internal error, or the wall-clock budget expired before
/// any feasible solution was found.
pub fn pack(
    batch_id: &str,
    items: &[PlacementItem],
    autoclave: &Autoclave,
    constraints: &ConstraintBundle,
) -> (Option<BatchLayout>, bool) {
    if items.len() > 60 {
        warn!(
            item_count = items.len(),
            "exact model invoked with a large item set; this may be slow"
        );
    }

    let cap_secs = constraints
        .solver_time_cap_secs
        .min(ConstraintBundle::SOLVER_TIME_CAP_HARD_MAX_SECS);
    let workers = constraints.solver_workers.max(1);

    let pool = match ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "failed to build solver thread pool; running on caller's thread");
            return build_and_solve(batch_id, items, autoclave, constraints, cap_secs);
        }
    };

    pool.install(|| build_and_solve(batch_id, items, autoclave, constraints, cap_secs))
}

fn build_and_solve(
    batch_id: &str,
    items: &[PlacementItem],
    autoclave: &Autoclave,
    constraints: &ConstraintBundle,
    cap_secs: f64,
) -> (Option<BatchLayout>, bool) {
    let beta = constraints.beta.round() as i32;
    let gamma = constraints.gamma.round() as i32;
    let interior_w = (autoclave.width.round() as i32 - 2 * beta).max(0);
    let interior_h = (autoclave.length.round() as i32 - 2 * beta).max(0);
    let vacuum_capacity = autoclave.vacuum_capacity as i32;

    let config = SolverConfig::default().with_timeout_ms((cap_secs * 1000.0) as u64);
    let mut model = Model::with_config(config);

    let dims: Vec<(i32, i32)> = items
        .iter()
        .map(|it| (it.width.round() as i32, it.height.round() as i32))
        .collect();

    let mut vars = Vec::with_capacity(items.len());
    for &(w0, h0) in &dims {
        let can_rotate = constraints.allow_rotation && w0 != h0;
        let r = if can_rotate { model.bool() } else { model.int(0, 0) };
        let s = model.bool();
        let (lo, hi) = (w0.min(h0), w0.max(h0));
        let w = model.int(lo, hi);
        let h = model.int(lo, hi);
        let x = model.int(0, interior_w.max(0));
        let y = model.int(0, interior_h.max(0));

        model.new(r.mul(h0 - w0).add(w0).eq(w));
        model.new(r.mul(w0 - h0).add(h0).eq(h));
        model.new(x.add(w).le(interior_w));
        model.new(y.add(h).le(interior_h));

        vars.push(ItemVars { x, y, r, s, w, h });
    }

    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if items[i].elevated != items[j].elevated {
                continue;
            }
            let vi = &vars[i];
            let vj = &vars[j];
            model.post_or(vec![
                vi.x.add(vi.w).add(gamma).le(vj.x),
                vj.x.add(vj.w).add(gamma).le(vi.x),
                vi.y.add(vi.h).add(gamma).le(vj.y),
                vj.y.add(vj.h).add(gamma).le(vi.y),
                vi.s.eq(0),
                vj.s.eq(0),
            ]);
        }
    }

    if let Some((first, rest)) = vars.split_first() {
        let mut capacity_expr = first.s.mul(items[0].vacuum_demand as i32);
        for (item, iv) in items.iter().skip(1).zip(rest) {
            capacity_expr = capacity_expr.add(iv.s.mul(item.vacuum_demand as i32));
        }
        model.new(capacity_expr.le(vacuum_capacity));
    }

    let total_area: i32 = dims.iter().map(|(w, h)| w * h).sum();
    let placed_area = model.int(0, total_area.max(0));
    if let Some((first, rest)) = vars.split_first() {
        let (w0, h0) = dims[0];
        let mut area_expr = first.s.mul(w0 * h0);
        for ((w, h), iv) in dims.iter().skip(1).zip(rest) {
            area_expr = area_expr.add(iv.s.mul(w * h));
        }
        model.new(area_expr.eq(placed_area));
    } else {
        model.new(placed_area.eq(0));
    }

    match model.maximize(placed_area) {
        Ok(solution) => {
            let mut placements = Vec::new();
            let mut contributing: HashSet<&str> = HashSet::new();
            let mut vacuum_used: u32 = 0;

            for (item, iv) in items.iter().zip(&vars) {
                let selected = matches!(solution[iv.s], Val::ValI(1));
                if !selected {
                    continue;
                }
                let x = val_i32(solution[iv.x]) + beta;
                let y = val_i32(solution[iv.y]) + beta;
                let w = val_i32(solution[iv.w]);
                let h = val_i32(solution[iv.h]);
                let rotated = matches!(solution[iv.r], Val::ValI(1));

                if !contributing.contains(item.wo_id.as_str()) {
                    contributing.insert(item.wo_id.as_str());
                    vacuum_used += item.vacuum_demand;
                }

                placements.push(Placement {
                    wo_id: item.wo_id.clone(),
                    tool_id: item.tool_id.clone(),
                    x: f64::from(x),
                    y: f64::from(y),
                    w: f64::from(w),
                    h: f64::from(h),
                    rotated,
                    level: u8::from(item.elevated),
                });
            }

            if placements.is_empty() {
                return (None, false);
            }

            let placed_area: f64 = placements.iter().map(Placement::area).sum();
            let layout = BatchLayout {
                id: batch_id.to_string(),
                autoclave_id: autoclave.id.clone(),
                placements,
                efficiency: round3(placed_area / autoclave.area()),
                total_weight: 0.0,
                vacuum_lines_used: vacuum_used,
            };
            (Some(layout), false)
        }
        Err(SolverError::Timeout { .. }) => (None, true),
        Err(_) => (None, false),
    }
}

fn val_i32(v: Val) -> i32 {
    match v {
        Val::ValI(i) => i,
        Val::ValF(f) => f.round() as i32,
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
