//! Elevation selection: ranks tools and chooses which are placed on the
//! second (upper) level, the first of the pipeline's two levels of
//! placement.

use std::collections::HashMap;

use autoclave_types::{Tool, WorkOrder};
use tracing::debug;

/// A scored candidate tool, carried alongside the WO it belongs to so the
/// final selection can be turned back into a `WO-id -> tool-ids` map.
struct Candidate {
    wo_id: String,
    tool: Tool,
    score: f64,
}

/// Ranks tools by elevation score and selects the top `p` fraction (by
/// count, not area) for the upper level, returning a `WO-id -> tool-ids` map
/// plus the fraction of total tool area that ended up elevated.
#[must_use]
pub fn select_elevated(work_orders: &[WorkOrder], p: f64) -> (HashMap<String, Vec<String>>, f64) {
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut total_area = 0.0_f64;

    for wo in work_orders {
        for tool in &wo.tools {
            total_area += tool.area();
            candidates.push(Candidate {
                wo_id: wo.id.clone(),
                score: elevation_score(tool),
                tool: tool.clone(),
            });
        }
    }

    let total_count = candidates.len();
    let take = (p * total_count as f64).ceil() as usize;

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.tool.area().total_cmp(&a.tool.area()))
            .then_with(|| a.tool.id.cmp(&b.tool.id))
    });

    let mut elevated_map: HashMap<String, Vec<String>> = HashMap::new();
    let mut elevated_area = 0.0_f64;

    for candidate in candidates.into_iter().take(take) {
        elevated_area += candidate.tool.area();
        elevated_map
            .entry(candidate.wo_id)
            .or_default()
            .push(candidate.tool.id);
    }

    let elevated_pct = if total_area > 0.0 {
        round1(100.0 * elevated_area / total_area)
    } else {
        0.0
    };

    debug!(
        tool_count = total_count,
        elevated_count = take,
        elevated_pct,
        "elevation selection complete"
    );

    (elevated_map, elevated_pct)
}

fn elevation_score(tool: &Tool) -> f64 {
    let area = tool.area();
    let aspect = tool.aspect();

    let area_s = (area / 1e6).min(1.0);
    let ar_s = ((aspect - 1.0) / 2.0).min(1.0);
    let wt_s = if tool.weight > 0.0 {
        (1.0 - tool.weight / 100.0).max(0.0)
    } else {
        0.8
    };

    let mut bonus = 0.0;
    if area >= 5e5 {
        bonus += 0.2;
    }
    if aspect >= 1.5 {
        bonus += 0.1;
    }

    0.4 * area_s + 0.3 * ar_s + 0.2 * wt_s + bonus
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
