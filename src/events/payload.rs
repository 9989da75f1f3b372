// Copyright (c) 2025 - Cowboy AI, Inc.
//! Polymorphic Event Payload
//!
//! Top-level tagged union over the per-aggregate event enums. This allows
//! polymorphic handling of different aggregate types while maintaining
//! type safety and exhaustiveness checking: dispatch on event type is a
//! match on variants, never runtime type inspection.

use serde::{Deserialize, Serialize};

use super::envelope::AggregateType;
use super::instance::InstanceEvent;
use super::org::OrgEvent;
use super::permission::PermissionEvent;
use super::project::ProjectEvent;
use super::user::UserEvent;

/// Aggregate event payload
///
/// Each variant carries events from one aggregate type. Projections that
/// declared interest in an aggregate type match on the inner enum and
/// treat variants they do not handle as documented no-ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum EventPayload {
    /// Events from the instance aggregate
    Instance(InstanceEvent),

    /// Events from the organization aggregate
    Org(OrgEvent),

    /// Events from the user aggregate
    User(UserEvent),

    /// Events from the project aggregate
    Project(ProjectEvent),

    /// Events from the permission aggregate
    Permission(PermissionEvent),
}

impl EventPayload {
    /// Aggregate type of this payload
    pub fn aggregate_type(&self) -> AggregateType {
        match self {
            EventPayload::Instance(_) => AggregateType::Instance,
            EventPayload::Org(_) => AggregateType::Org,
            EventPayload::User(_) => AggregateType::User,
            EventPayload::Project(_) => AggregateType::Project,
            EventPayload::Permission(_) => AggregateType::Permission,
        }
    }

    /// Dotted event type name, e.g. `instance.domain.primary.set`
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::Instance(e) => e.event_type(),
            EventPayload::Org(e) => e.event_type(),
            EventPayload::User(e) => e.event_type(),
            EventPayload::Project(e) => e.event_type(),
            EventPayload::Permission(e) => e.event_type(),
        }
    }
}
