//! Scheduler layer for the agent
//!
//! This layer long-polls the orchestrator for dispatched executions of
//! every configured instance and hands them to the step executor without
//! waiting for them to finish.

pub mod poller;

pub use poller::ExecutionPoller;
