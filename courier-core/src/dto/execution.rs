//! Execution DTOs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::execution::ExecutionState;
use crate::domain::instance::Instance;

/// Request to create (and enqueue) a new execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExecution {
    pub template_id: i64,
    #[serde(default)]
    pub variable_set_id: Option<i64>,
    pub instance: Instance,
    #[serde(default)]
    pub variable_overrides: HashMap<String, String>,
}

/// Query string of a step report
///
/// `result` is present only on the final report of an attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    pub result: Option<ExecutionState>,
}

/// Query string of the long-poll check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckQuery {
    /// Requested long-poll window in seconds
    pub timeout: Option<u64>,
}

/// Optional filter when listing executions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionFilter {
    pub tenant: Option<String>,
    pub environment: Option<String>,
}
