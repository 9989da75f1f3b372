// Copyright (c) 2025 - Cowboy AI, Inc.
//! Core Domain Value Objects
//!
//! Validated value objects shared by the event model, the fact index, and
//! the permission resolution engine.
//!
//! # Value Objects with Invariants
//!
//! - [`Permission`] - dotted lowercase permission names (`org.read`)
//! - [`Role`] - opaque role identifiers (`ORG_OWNER`)
//! - [`ScopeType`] - the System/Instance/Organization/Project/ProjectGrant
//!   hierarchy, with an `Unknown` fallback for forward compatibility
//! - [`OrgState`] - organization lifecycle states with a terminal `Removed`
//!
//! Tenant, organization, user, and project identifiers stay plain strings:
//! they are issued by the surrounding system and carried opaquely; all
//! cross-entity relationships are looked up by identifier, never held as
//! references.

pub mod permission;
pub mod scope;

pub use permission::{Permission, PermissionError, Role};
pub use scope::{OrgState, ScopeType};
