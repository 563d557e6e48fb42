//! Core domain types
//!
//! The entities the orchestrator persists and the agent executes. They are
//! shared verbatim over the wire between orchestrator, agent and CLI.

pub mod execution;
pub mod instance;
pub mod package;
pub mod template;
pub mod variables;
