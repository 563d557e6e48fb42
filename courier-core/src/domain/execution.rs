//! Execution domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::instance::Instance;

/// One deployment attempt against an instance
///
/// Persisted by the orchestrator, which owns every state transition.
/// Agents only read it and append step states through reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: i64,
    pub template_id: i64,
    pub variable_set_id: Option<i64>,
    pub instance: Instance,
    pub retry_count: u32,
    pub state: ExecutionState,
    pub steps_states: Vec<StepState>,
    pub variable_overrides: HashMap<String, String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Execution lifecycle state
///
/// `Added` and `Retrying` are pending; the others are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    Added,
    Retrying,
    #[serde(rename = "Successed")]
    Succeeded,
    Failed,
    Declined,
}

impl ExecutionState {
    /// Whether an agent may still work on an execution in this state
    pub fn is_pending(self) -> bool {
        matches!(self, ExecutionState::Added | ExecutionState::Retrying)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_pending()
    }

    /// Wire name, also used as the stored column value
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionState::Added => "Added",
            ExecutionState::Retrying => "Retrying",
            ExecutionState::Succeeded => "Successed",
            ExecutionState::Failed => "Failed",
            ExecutionState::Declined => "Declined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Added" => Some(ExecutionState::Added),
            "Retrying" => Some(ExecutionState::Retrying),
            "Successed" => Some(ExecutionState::Succeeded),
            "Failed" => Some(ExecutionState::Failed),
            "Declined" => Some(ExecutionState::Declined),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported outcome of one pipeline step
///
/// Written exactly once per step attempt by the agent's log shipper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepState {
    /// Order of the step in its template; 0 for executor-level failures
    pub step_id: i32,
    pub step_name: String,
    /// Host name of the reporting agent
    pub executor: String,
    pub success: bool,
    pub log: Vec<String>,
    pub reported_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&ExecutionState::Succeeded).unwrap(),
            "\"Successed\""
        );
        assert_eq!(
            serde_json::from_str::<ExecutionState>("\"Retrying\"").unwrap(),
            ExecutionState::Retrying
        );

        for state in [
            ExecutionState::Added,
            ExecutionState::Retrying,
            ExecutionState::Succeeded,
            ExecutionState::Failed,
            ExecutionState::Declined,
        ] {
            assert_eq!(ExecutionState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ExecutionState::parse("Running"), None);
    }

    #[test]
    fn test_pending_states() {
        assert!(ExecutionState::Added.is_pending());
        assert!(ExecutionState::Retrying.is_pending());
        assert!(ExecutionState::Succeeded.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
        assert!(ExecutionState::Declined.is_terminal());
    }
}
