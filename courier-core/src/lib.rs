//! Courier Core
//!
//! Core types shared by the Courier services.
//!
//! This crate contains:
//! - Domain types: Instance, Execution, Template, VariableSet, Package
//! - DTOs: Request and query payloads exchanged between orchestrator, agent and CLI

pub mod domain;
pub mod dto;
