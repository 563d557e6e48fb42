//! Template domain types

use serde::{Deserialize, Serialize};

/// Ordered step pipeline, reusable across executions
///
/// Updates replace the whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub steps: Vec<Step>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Template {
    /// Steps in execution order
    pub fn ordered_steps(&self) -> Vec<&Step> {
        let mut steps: Vec<&Step> = self.steps.iter().collect();
        steps.sort_by_key(|step| step.order);
        steps
    }
}

/// A single pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub order: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub working_folder: String,
    /// Package name for `Archive` steps
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Kind of work a step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepType {
    Archive,
    PShell,
    #[serde(rename = "CMD")]
    Cmd,
    Docker,
    DockerCompose,
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepType::Archive => write!(f, "Archive"),
            StepType::PShell => write!(f, "PShell"),
            StepType::Cmd => write!(f, "CMD"),
            StepType::Docker => write!(f, "Docker"),
            StepType::DockerCompose => write!(f, "DockerCompose"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_deserialization() {
        let step: Step = serde_json::from_value(serde_json::json!({
            "order": 3,
            "name": "Variables",
            "type": "CMD",
            "command": "echo {Tenant}"
        }))
        .unwrap();

        assert_eq!(step.step_type, StepType::Cmd);
        assert_eq!(step.working_folder, "");
        assert!(step.file_name.is_none());
    }

    #[test]
    fn test_unknown_step_type_is_rejected() {
        let result = serde_json::from_value::<Step>(serde_json::json!({
            "order": 1,
            "name": "Bad",
            "type": "Bash"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_ordered_steps() {
        let step = |order: i32| Step {
            order,
            name: format!("step-{}", order),
            step_type: StepType::Cmd,
            command: String::new(),
            working_folder: String::new(),
            file_name: None,
        };
        let template = Template {
            id: 1,
            name: "t".to_string(),
            steps: vec![step(3), step(1), step(2)],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let orders: Vec<i32> = template.ordered_steps().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }
}
