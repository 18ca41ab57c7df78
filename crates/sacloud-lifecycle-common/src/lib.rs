//! sacloud-lifecycle-common - Shared types
//!
//! This crate provides the resource model and gateway interface used by the
//! monitor and resolvers, without any HTTP dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`gateway`]: The `ResourceGateway` trait and its error type
//! - [`id`]: Numeric resource identifiers
//! - [`resource`]: Resource snapshots and search results
//! - [`resource_kind`]: API collections
//! - [`status`]: Readiness states and link availability
//! - [`tags`]: Well-known tags

pub mod defaults;
pub mod gateway;
pub mod id;
pub mod resource;
pub mod resource_kind;
pub mod status;
pub mod tags;

// Re-export commonly used types
pub use gateway::{GatewayError, ResourceGateway};
pub use id::{IdParseError, ResourceId, is_numeric_token};
pub use resource::{InterfaceRef, Resource, SearchResult, SourceLink};
pub use resource_kind::ResourceKind;
pub use status::{Availability, ResourceState};
