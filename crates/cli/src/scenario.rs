//! The on-disk shape of a scenario file: everything `analyze`/`execute`
//! needs, serialized as one JSON document so integration tests and manual
//! runs can share fixtures.

use std::collections::HashMap;

use autoclave_types::{Autoclave, ConstraintBundle, WorkOrder};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub work_orders: Vec<WorkOrder>,
    pub autoclaves: Vec<Autoclave>,
    #[serde(default)]
    pub selected_cycles: Vec<String>,
    #[serde(default)]
    pub elevated_tool_ids: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub cycle_to_autoclave: Option<HashMap<String, String>>,
    #[serde(default)]
    pub constraints: Option<ConstraintBundle>,
}

impl ScenarioFile {
    pub fn constraints(&self) -> ConstraintBundle {
        self.constraints.clone().unwrap_or_default()
    }
}
