//! Service layer
//!
//! Services hold the agent's business logic: running the steps of an
//! execution, launching step processes, handling archive steps, resolving
//! variables and shipping step reports back to the orchestrator.
//!
//! The runner is trait-based so the executor can be tested without
//! spawning processes.

pub mod archive;
pub mod executor;
pub mod log_shipper;
pub mod runner;
pub mod variables;

// Re-export traits
pub use runner::CommandRunner;

// Re-export implementations
pub use executor::StepExecutor;
pub use log_shipper::{LogShipper, StepReport};
pub use runner::{ProcessRunner, RunOutput};
pub use variables::Variables;
