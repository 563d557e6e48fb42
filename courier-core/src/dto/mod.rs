//! Data Transfer Objects for inter-service communication
//!
//! Request bodies and query strings exchanged between the orchestrator API,
//! the agent and the CLI.

pub mod execution;
pub mod package;
pub mod template;
pub mod variables;
