//! Shared domain types and error taxonomy for the autoclave curing-batch
//! packing pipeline.
//!
//! Every entity here is constructed once from the input and never mutated;
//! placements and batches are produced as new values by the solver and the
//! batch builder.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rectangular fixture holding a part, the geometric object actually
/// packed into an autoclave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    /// Width in millimetres, strictly positive.
    pub width: f64,
    /// Height in millimetres, strictly positive.
    pub height: f64,
    /// Weight in kilograms, non-negative.
    pub weight: f64,
}

impl Tool {
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Ratio of the longer side to the shorter side; always >= 1.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        let (long, short) = if self.width >= self.height {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        if short <= 0.0 {
            1.0
        } else {
            long / short
        }
    }
}

/// A production order referencing one or more tools, all to be cured
/// together under one curing cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub display_number: String,
    pub part_number: String,
    pub curing_cycle: String,
    /// Number of vacuum lines this WO demands, always >= 1.
    pub vacuum_demand: u32,
    pub tools: Vec<Tool>,
}

impl WorkOrder {
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.tools.iter().map(Tool::area).sum()
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.tools.iter().map(|t| t.weight).sum()
    }

    /// The single largest tool by area, if any.
    #[must_use]
    pub fn largest_tool(&self) -> Option<&Tool> {
        self.tools
            .iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
    }
}

/// A rectangular industrial oven bin into which tools are packed for curing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Autoclave {
    pub id: String,
    pub code: String,
    /// Interior width in millimetres.
    pub width: f64,
    /// Interior length (depth) in millimetres.
    pub length: f64,
    /// Vacuum-line capacity, always >= 1.
    pub vacuum_capacity: u32,
    /// Optional maximum total weight, in kilograms.
    pub max_weight: Option<f64>,
}

impl Autoclave {
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.length
    }
}

/// One tool placed at a position inside an autoclave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub wo_id: String,
    pub tool_id: String,
    /// Lower-left corner x coordinate, millimetres from the autoclave origin.
    pub x: f64,
    pub y: f64,
    /// Effective width after rotation.
    pub w: f64,
    /// Effective height after rotation.
    pub h: f64,
    pub rotated: bool,
    /// 0 = floor level, 1 = elevated (second) level.
    pub level: u8,
}

impl Placement {
    #[must_use]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }
}

/// The result of packing one or more work-orders into a single autoclave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchLayout {
    pub id: String,
    pub autoclave_id: String,
    pub placements: Vec<Placement>,
    /// Fraction of the autoclave floor area covered, in [0, 1], rounded to 3
    /// decimals.
    pub efficiency: f64,
    pub total_weight: f64,
    pub vacuum_lines_used: u32,
}

/// Work-orders sharing one curing-cycle code, with an aggregate desirability
/// score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleGroup {
    pub cycle_code: String,
    pub work_orders: Vec<WorkOrder>,
    pub aggregate_area: f64,
    /// In [0, 1], rounded to 3 decimals.
    pub score: f64,
}

/// A decision to run one curing-cycle's work-orders in one autoclave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleAssignment {
    pub cycle_code: String,
    pub autoclave_id: String,
    pub reason: String,
    pub wo_count: usize,
    pub aggregate_area: f64,
}

/// The record type the placement solver reasons over internally: one
/// rectangle to place, carrying back a reference to the work order and tool
/// it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementItem {
    pub wo_id: String,
    pub tool_id: String,
    pub width: f64,
    pub height: f64,
    pub vacuum_demand: u32,
    pub elevated: bool,
}

impl PlacementItem {
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Geometric and resource constraints shared by every placement attempt, and
/// the solver's runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintBundle {
    /// Minimum gap between any placement and the autoclave wall, mm.
    pub beta: f64,
    /// Minimum gap between any two placements on the same level, mm.
    pub gamma: f64,
    pub allow_rotation: bool,
    /// Degrees; only 90 is used by the solver.
    pub rotation_step: u16,
    /// Fraction of tools eligible for elevation, e.g. 0.35.
    pub elevation_cap: f64,
    /// Advisory only; not enforced by the solver.
    pub support_spacing: f64,
    pub solver_time_cap_secs: f64,
    pub solver_workers: usize,
}

impl ConstraintBundle {
    /// Hard ceiling on `solver_time_cap_secs` regardless of caller override.
    pub const SOLVER_TIME_CAP_HARD_MAX_SECS: f64 = 300.0;

    /// The acceptance threshold below which the exact model is attempted
    /// after the heuristic.
    pub const EXACT_ACCEPTANCE_THRESHOLD: f64 = 0.4;
}

impl Default for ConstraintBundle {
    fn default() -> Self {
        Self {
            beta: 20.0,
            gamma: 15.0,
            allow_rotation: true,
            rotation_step: 90,
            elevation_cap: 0.35,
            support_spacing: 300.0,
            solver_time_cap_secs: 60.0,
            solver_workers: 6,
        }
    }
}

/// Per-batch figures reported alongside the run's aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub id: String,
    pub efficiency: f64,
    pub wo_count: usize,
    pub is_recommended: bool,
}

/// Aggregate figures for one `execute` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OptimizationMetrics {
    pub wo_count_in: usize,
    pub wo_count_placed: usize,
    pub cycles_processed: usize,
    pub batches_produced: usize,
    /// True if any solver attempt exhausted its wall-clock budget.
    pub partial: bool,
    pub batch_summaries: Vec<BatchSummary>,
    pub assignment_rationale: Vec<String>,
}

/// The result of an `execute` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecuteOutcome {
    Success {
        batches: Vec<BatchLayout>,
        metrics: OptimizationMetrics,
    },
    SuccessPartial {
        batches: Vec<BatchLayout>,
        metrics: OptimizationMetrics,
        unplaced_wo_count: usize,
    },
    Rejected {
        errors: Vec<AutoclaveError>,
    },
}

/// The fatal error taxonomy for the pipeline. Non-fatal conditions
/// (solver-timeout, solver-infeasible) are absorbed into
/// [`OptimizationMetrics`] rather than surfaced as errors.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum AutoclaveError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("work order {wo_id} cannot proceed: {reason}")]
    LockConflict { wo_id: String, reason: String },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

pub type Result<T> = std::result::Result<T, AutoclaveError>;
