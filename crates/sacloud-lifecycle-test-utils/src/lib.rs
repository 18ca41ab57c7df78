//! Shared test utilities for sacloud-lifecycle
//!
//! This crate provides common test helpers that can be used across
//! multiple test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`fixtures`]: Resource builders
//! - [`gateway`]: Scriptable in-memory gateway

pub mod fixtures;
pub mod gateway;

// Re-export commonly used items
pub use fixtures::{
    archive, disk, disk_chain, disk_from_archive, disk_from_disk, id, packet_filter, server,
};
pub use gateway::FakeGateway;
