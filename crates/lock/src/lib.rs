//! The "ODL lock" collaborator: the sole piece of shared mutable state the
//! orchestrator touches.
//!
//! An explicit, injectable collaborator (a trait plus an in-memory
//! implementation) rather than process-global state, so the rest of the
//! core stays a pure function of its inputs.

use std::collections::HashMap;
use std::sync::Mutex;

use autoclave_types::AutoclaveError;
use tracing::warn;

/// A work-order's standing with the external production-status oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionStatus {
    Available,
    /// Near its curing deadline; a warning, not a blocking error.
    NearDeadline,
    InAutoclave,
    Completed,
}

/// The outcome of validating a set of work-order ids against the lock
/// registry.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid_ids: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<AutoclaveError>,
}

/// The external "ODL lock" contract. Implementations must make
/// `release_batch` idempotent and `register_batch` exclusive (no two
/// concurrent callers may register the same WO into two different batches).
pub trait LockRegistry: Send + Sync {
    fn validate(&self, wo_ids: &[String]) -> ValidationReport;
    fn register_batch(&self, batch_id: &str, wo_ids: &[String], autoclave_id: &str);
    fn release_batch(&self, batch_id: &str);
}

#[derive(Default)]
struct State {
    statuses: HashMap<String, ProductionStatus>,
    locked_by: HashMap<String, String>,
    batches: HashMap<String, Vec<String>>,
}

/// An in-memory stand-in for the production ODL lock service, suitable for
/// tests and single-process deployments.
pub struct InMemoryLockRegistry {
    state: Mutex<State>,
}

impl InMemoryLockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Seed a WO's production status, as the simulated status oracle would
    /// report it.
    pub fn set_status(&self, wo_id: impl Into<String>, status: ProductionStatus) {
        self.state
            .lock()
            .expect("lock registry mutex poisoned")
            .statuses
            .insert(wo_id.into(), status);
    }
}

impl Default for InMemoryLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LockRegistry for InMemoryLockRegistry {
    fn validate(&self, wo_ids: &[String]) -> ValidationReport {
        let state = self.state.lock().expect("lock registry mutex poisoned");
        let mut report = ValidationReport::default();

        for wo_id in wo_ids {
            if let Some(batch_id) = state.locked_by.get(wo_id) {
                report.errors.push(AutoclaveError::LockConflict {
                    wo_id: wo_id.clone(),
                    reason: format!("already registered in batch {batch_id}"),
                });
                continue;
            }

            match state.statuses.get(wo_id) {
                Some(ProductionStatus::InAutoclave) => {
                    report.errors.push(AutoclaveError::LockConflict {
                        wo_id: wo_id.clone(),
                        reason: "already in an autoclave".to_string(),
                    });
                }
                Some(ProductionStatus::Completed) => {
                    report.errors.push(AutoclaveError::LockConflict {
                        wo_id: wo_id.clone(),
                        reason: "production already completed".to_string(),
                    });
                }
                Some(ProductionStatus::NearDeadline) => {
                    report
                        .warnings
                        .push(format!("{wo_id} is near its curing deadline"));
                    report.valid_ids.push(wo_id.clone());
                }
                Some(ProductionStatus::Available) | None => {
                    report.valid_ids.push(wo_id.clone());
                }
            }
        }

        report
    }

    fn register_batch(&self, batch_id: &str, wo_ids: &[String], autoclave_id: &str) {
        let mut state = self.state.lock().expect("lock registry mutex poisoned");
        for wo_id in wo_ids {
            state
                .locked_by
                .insert(wo_id.clone(), batch_id.to_string());
        }
        state
            .batches
            .insert(batch_id.to_string(), wo_ids.to_vec());
        let _ = autoclave_id;
    }

    fn release_batch(&self, batch_id: &str) {
        let mut state = self.state.lock().expect("lock registry mutex poisoned");
        if let Some(wo_ids) = state.batches.remove(batch_id) {
            for wo_id in wo_ids {
                state.locked_by.remove(&wo_id);
            }
        } else {
            warn!(batch_id, "release_batch called for unknown batch; treating as no-op");
        }
    }
}
