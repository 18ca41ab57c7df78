//! sacloud-lifecycle - Lifecycle helpers for cloud control-plane resources
//!
//! This crate waits for long-running resource operations to finish, decides
//! whether a disk may be edited in place from its provenance chain, and
//! resolves id-or-name references to packet filters.

pub mod api;
pub mod config;
pub mod error;
pub mod monitor;
pub mod provenance;
pub mod reference;
pub mod wait;

pub use api::HttpGateway;
pub use config::{ApiConfig, Config, EditPolicy, MonitorConfig};
pub use error::{ConfigError, MonitorError, ResolveError};
pub use monitor::{ReadinessWatch, StateMonitor};
pub use provenance::{EditAssessment, EditReason, ProvenanceResolver};
pub use reference::{NicSlot, ReferenceResolver};
