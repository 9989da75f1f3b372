//! Event-sourced authorization core for a multi-tenant IAM backend
//!
//! This crate provides the event log, the reduction framework with its
//! entity projections, the queryable fact index, and the permission
//! resolution engine that answers authorization queries over it.

pub mod domain;
pub mod errors;
pub mod events;
pub mod fields;
pub mod permission;
pub mod projection;
pub mod store;

// Re-export commonly used types
pub use errors::{CoreError, CoreResult};
pub use events::{AggregateType, Event, EventPayload};
pub use fields::{FieldIndex, FieldProjection};
pub use permission::{
    check_static_grants, PermissionDecision, PermissionResolver, ProjectGrantRef, StaticGrant,
};
pub use projection::{Projection, ProjectionRegistry, ProjectionRunner};
pub use store::{AppendRequest, EventLog, MemoryEventLog, NatsEventLog, UniqueOp};
