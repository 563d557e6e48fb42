//! Repository layer
//!
//! Trait-based access to the orchestrator so the executor, poller and log
//! shipper can be exercised against in-memory fakes.

mod executions;

pub use executions::{ExecutionRepository, HttpExecutionRepository};
