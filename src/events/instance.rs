// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance Aggregate Events
//!
//! The instance aggregate covers tenant lifecycle, instance domains, the
//! tenant-wide default login policy, and instance-level memberships.

use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// Events of the instance aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceEvent {
    /// Instance created
    Added { name: String },

    /// Instance renamed
    Changed { name: String },

    /// Default organization for new resources set
    DefaultOrgSet { org_id: String },

    /// Default language set
    DefaultLanguageSet { language: String },

    /// Console application registered
    ConsoleSet { app_id: String },

    /// Domain added to the instance
    DomainAdded { domain: String, is_generated: bool },

    /// Domain marked primary; clears the primary flag on all others
    DomainPrimarySet { domain: String },

    /// Domain removed from the instance
    DomainRemoved { domain: String },

    /// Tenant-wide default login policy set; organizations may override it
    DomainPolicySet { user_login_must_be_domain: bool },

    /// User granted roles on the whole instance
    MemberAdded { user_id: String, roles: Vec<Role> },

    /// Member roles replaced
    MemberChanged { user_id: String, roles: Vec<Role> },

    /// Membership revoked
    MemberRemoved { user_id: String },

    /// Instance removed (terminal)
    Removed,
}

impl InstanceEvent {
    /// Dotted event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            InstanceEvent::Added { .. } => "instance.added",
            InstanceEvent::Changed { .. } => "instance.changed",
            InstanceEvent::DefaultOrgSet { .. } => "instance.default.org.set",
            InstanceEvent::DefaultLanguageSet { .. } => "instance.default.language.set",
            InstanceEvent::ConsoleSet { .. } => "instance.iam.console.set",
            InstanceEvent::DomainAdded { .. } => "instance.domain.added",
            InstanceEvent::DomainPrimarySet { .. } => "instance.domain.primary.set",
            InstanceEvent::DomainRemoved { .. } => "instance.domain.removed",
            InstanceEvent::DomainPolicySet { .. } => "instance.policy.domain.set",
            InstanceEvent::MemberAdded { .. } => "instance.member.added",
            InstanceEvent::MemberChanged { .. } => "instance.member.changed",
            InstanceEvent::MemberRemoved { .. } => "instance.member.removed",
            InstanceEvent::Removed => "instance.removed",
        }
    }
}
