//! Courier Orchestrator
//!
//! Control point of the deployment dispatch system. Accepts executions keyed
//! by (tenant, environment), keeps one durable queue per key, hands executions
//! to long-polling agents and applies the retry policy to their reports.
//!
//! Layers:
//! - `api`: axum handlers and error mapping
//! - `service`: dispatch and resource business logic
//! - `repository`: sqlx queries against the execution store
//! - `queue`: durable per-instance queues
//! - `storage`: package blob store

pub mod api;
pub mod config;
pub mod db;
pub mod queue;
pub mod repository;
pub mod service;
pub mod state;
pub mod storage;
