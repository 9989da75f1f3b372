// Copyright (c) 2025 - Cowboy AI, Inc.
//! Project Aggregate Events
//!
//! Projects live under an organization (the resource owner). A project
//! grant shares the project with another organization; grant memberships
//! are scoped to the `(project, grant)` pair.

use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// Events of the project aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectEvent {
    /// Project created
    Added { name: String },

    /// Project renamed
    Changed { name: String },

    /// Project removed (terminal)
    Removed,

    /// Project granted to another organization
    GrantAdded {
        grant_id: String,
        granted_org_id: String,
    },

    /// Project grant revoked
    GrantRemoved { grant_id: String },

    /// User granted roles on the project
    MemberAdded { user_id: String, roles: Vec<Role> },

    /// Member roles replaced
    MemberChanged { user_id: String, roles: Vec<Role> },

    /// Membership revoked
    MemberRemoved { user_id: String },

    /// User granted roles on a project grant
    GrantMemberAdded {
        grant_id: String,
        user_id: String,
        roles: Vec<Role>,
    },

    /// Grant membership revoked
    GrantMemberRemoved { grant_id: String, user_id: String },
}

impl ProjectEvent {
    /// Dotted event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            ProjectEvent::Added { .. } => "project.added",
            ProjectEvent::Changed { .. } => "project.changed",
            ProjectEvent::Removed => "project.removed",
            ProjectEvent::GrantAdded { .. } => "project.grant.added",
            ProjectEvent::GrantRemoved { .. } => "project.grant.removed",
            ProjectEvent::MemberAdded { .. } => "project.member.added",
            ProjectEvent::MemberChanged { .. } => "project.member.changed",
            ProjectEvent::MemberRemoved { .. } => "project.member.removed",
            ProjectEvent::GrantMemberAdded { .. } => "project.grant.member.added",
            ProjectEvent::GrantMemberRemoved { .. } => "project.grant.member.removed",
        }
    }
}
