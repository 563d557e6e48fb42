//! Package DTOs

use serde::{Deserialize, Serialize};

/// Query string of a package lookup; latest version when absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageQuery {
    pub version: Option<String>,
}
