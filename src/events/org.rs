// Copyright (c) 2025 - Cowboy AI, Inc.
//! Organization Aggregate Events

use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// Events of the organization aggregate
///
/// `Removed` is terminal for the aggregate: projections tombstone the
/// organization and apply no further mutation to it (other aggregates may
/// still react, e.g. memberships are retracted from the fact index).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrgEvent {
    /// Organization created; claims the name as unique within the tenant
    Added { name: String },

    /// Organization renamed; releases the old name, claims the new one
    Changed { name: String },

    /// Organization deactivated (reversible)
    Deactivated,

    /// Organization reactivated
    Reactivated,

    /// Organization removed (terminal)
    Removed,

    /// Domain registered for the organization
    DomainAdded { domain: String },

    /// Domain ownership verified; claims the domain as unique within the
    /// tenant and makes it eligible for login-name suffixing
    DomainVerified { domain: String },

    /// Domain removed; releases the uniqueness claim
    DomainRemoved { domain: String },

    /// Domain marked primary; clears the primary flag on all others
    DomainPrimarySet { domain: String },

    /// Org-level login policy override added
    DomainPolicyAdded { user_login_must_be_domain: bool },

    /// Org-level login policy override changed
    DomainPolicyChanged { user_login_must_be_domain: bool },

    /// Org-level login policy override removed; instance default applies
    DomainPolicyRemoved,

    /// User granted roles on the organization
    MemberAdded { user_id: String, roles: Vec<Role> },

    /// Member roles replaced
    MemberChanged { user_id: String, roles: Vec<Role> },

    /// Membership revoked
    MemberRemoved { user_id: String },
}

impl OrgEvent {
    /// Dotted event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            OrgEvent::Added { .. } => "org.added",
            OrgEvent::Changed { .. } => "org.changed",
            OrgEvent::Deactivated => "org.deactivated",
            OrgEvent::Reactivated => "org.reactivated",
            OrgEvent::Removed => "org.removed",
            OrgEvent::DomainAdded { .. } => "org.domain.added",
            OrgEvent::DomainVerified { .. } => "org.domain.verified",
            OrgEvent::DomainRemoved { .. } => "org.domain.removed",
            OrgEvent::DomainPrimarySet { .. } => "org.domain.primary.set",
            OrgEvent::DomainPolicyAdded { .. } => "org.policy.domain.added",
            OrgEvent::DomainPolicyChanged { .. } => "org.policy.domain.changed",
            OrgEvent::DomainPolicyRemoved => "org.policy.domain.removed",
            OrgEvent::MemberAdded { .. } => "org.member.added",
            OrgEvent::MemberChanged { .. } => "org.member.changed",
            OrgEvent::MemberRemoved { .. } => "org.member.removed",
        }
    }
}
