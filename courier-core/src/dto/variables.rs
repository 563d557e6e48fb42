//! Variable set DTOs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::instance::Instance;

/// Request to create or replace a variable set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVariableSet {
    pub instance: Instance,
    #[serde(default)]
    pub values: HashMap<String, String>,
}
