//! Variable set domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::instance::Instance;

/// Reusable named values for an instance
///
/// Merged with per-execution overrides at dispatch time; overrides win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSet {
    pub id: i64,
    pub instance: Instance,
    pub values: HashMap<String, String>,
}
