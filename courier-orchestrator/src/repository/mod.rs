//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Each repository handles database operations for a specific domain entity.

pub mod execution;
pub mod package;
pub mod template;
pub mod variables;

// Re-export for convenience
pub use execution as execution_repository;
pub use package as package_repository;
pub use template as template_repository;
pub use variables as variables_repository;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encodes a value for a JSON text column
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Decodes a JSON text column
pub(crate) fn from_json<T: DeserializeOwned>(value: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
