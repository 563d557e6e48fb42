//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services orchestrate between repositories, queues and blob storage.

pub mod execution;
pub mod package;
pub mod template;
pub mod variables;

// Re-export for convenience
pub use execution as execution_service;
pub use package as package_service;
pub use template as template_service;
pub use variables as variables_service;
