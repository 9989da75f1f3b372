// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Envelope
//!
//! Wraps aggregate event payloads with the stream coordinates every
//! projection and the fact index rely on: tenant, aggregate, resource
//! owner, and the strictly increasing per-stream sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::payload::EventPayload;

/// Aggregate types known to this core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    /// Tenant lifecycle and instance-wide settings
    Instance,
    /// Organizations within a tenant
    Org,
    /// User identities
    User,
    /// Projects and project grants
    Project,
    /// Role-to-permission mappings
    Permission,
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateType::Instance => write!(f, "instance"),
            AggregateType::Org => write!(f, "org"),
            AggregateType::User => write!(f, "user"),
            AggregateType::Project => write!(f, "project"),
            AggregateType::Permission => write!(f, "permission"),
        }
    }
}

/// Immutable domain event
///
/// Events are append-only facts. `sequence` is strictly increasing within
/// one `(tenant_id, aggregate_type, aggregate_id)` stream with no gaps;
/// appends enforce this through optimistic concurrency. Events are never
/// mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID (UUID v7 for time-ordering)
    pub event_id: Uuid,

    /// Tenant this event belongs to; no read ever crosses tenants
    pub tenant_id: String,

    /// Aggregate ID within the tenant
    pub aggregate_id: String,

    /// Organization (or instance) owning the aggregate
    pub resource_owner: String,

    /// Position within the aggregate stream, starting at 1
    pub sequence: u64,

    /// When the event was committed
    pub created_at: DateTime<Utc>,

    /// User or service that caused the event
    pub editor: String,

    /// The aggregate-specific fact
    pub payload: EventPayload,
}

impl Event {
    /// Aggregate type, derived from the payload variant
    pub fn aggregate_type(&self) -> AggregateType {
        self.payload.aggregate_type()
    }

    /// Dotted event type name, e.g. `org.domain.added`
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
