//! Shared fixture builders for the workspace-level integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use autoclave_lock::InMemoryLockRegistry;
use autoclave_orchestrator::Orchestrator;
use autoclave_types::{Autoclave, ConstraintBundle, Tool, WorkOrder};

pub fn tool(id: &str, w: f64, h: f64) -> Tool {
    Tool {
        id: id.to_string(),
        width: w,
        height: h,
        weight: 10.0,
    }
}

pub fn wo(id: &str, cycle: &str, vacuum_demand: u32, tools: Vec<Tool>) -> WorkOrder {
    WorkOrder {
        id: id.to_string(),
        display_number: id.to_string(),
        part_number: format!("P-{id}"),
        curing_cycle: cycle.to_string(),
        vacuum_demand,
        tools,
    }
}

/// A work order carrying a single tool of the given dimensions.
pub fn single_tool_wo(id: &str, cycle: &str, w: f64, h: f64, vacuum_demand: u32) -> WorkOrder {
    wo(id, cycle, vacuum_demand, vec![tool(&format!("{id}-T"), w, h)])
}

/// A work order carrying `count` tools of identical dimensions, named
/// `{id}-T0`, `{id}-T1`, ... This is how one work order's own tool list
/// reaches the solver as a single candidate regardless of the batch
/// builder's retention threshold, since the builder always forces a batch
/// for whichever single work order it cannot otherwise combine.
pub fn multi_tool_wo(id: &str, cycle: &str, dims: &[(f64, f64)], vacuum_demand: u32) -> WorkOrder {
    let tools = dims
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| tool(&format!("{id}-T{i}"), w, h))
        .collect();
    wo(id, cycle, vacuum_demand, tools)
}

pub fn autoclave(id: &str, w: f64, h: f64, vacuum_capacity: u32) -> Autoclave {
    Autoclave {
        id: id.to_string(),
        code: id.to_string(),
        width: w,
        length: h,
        vacuum_capacity,
        max_weight: None,
    }
}

pub fn orchestrator() -> Orchestrator {
    Orchestrator::new(Arc::new(InMemoryLockRegistry::new()))
}

pub fn default_constraints() -> ConstraintBundle {
    ConstraintBundle::default()
}
