// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain Events
//!
//! All state changes in the platform are recorded as immutable domain
//! events. Events are past-tense facts, never commands; they are appended
//! to per-aggregate streams and consumed by projections.
//!
//! # Event Flow
//!
//! ```text
//! Writer → EventLog (append, optimistic concurrency)
//!               ↓
//!         Projections (fact index, entity read models)
//!               ↓
//!         Permission resolution / queries
//! ```
//!
//! # Module Organization
//!
//! - [`envelope`] - the [`Event`] envelope with stream coordinates
//! - [`payload`] - the polymorphic [`EventPayload`] union
//! - [`instance`], [`org`], [`user`], [`project`], [`permission`] -
//!   per-aggregate event enums

pub mod envelope;
pub mod instance;
pub mod org;
pub mod payload;
pub mod permission;
pub mod project;
pub mod user;

// Re-export commonly used types
pub use envelope::{AggregateType, Event};
pub use instance::InstanceEvent;
pub use org::OrgEvent;
pub use payload::EventPayload;
pub use permission::PermissionEvent;
pub use project::ProjectEvent;
pub use user::UserEvent;
