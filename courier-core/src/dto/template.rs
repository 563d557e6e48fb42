//! Template DTOs

use serde::{Deserialize, Serialize};

use crate::domain::template::Step;

/// Request to create or replace a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplate {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
}
