//! Courier Agent
//!
//! Runs on a deployment target and executes the executions dispatched for
//! the instances it serves.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Repositories: HTTP communication with the orchestrator
//! - Services: Step execution, process runner, archives, variables, log shipping
//! - Scheduler: Execution polling and supervision

pub mod config;
pub mod logging;
pub mod repository;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;
