// Copyright (c) 2025 - Cowboy AI, Inc.
//! Authorization Scope Hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope at which a permission can be held
///
/// Scopes form a hierarchy from widest to narrowest:
///
/// ```text
/// System → Instance → Organization → Project → ProjectGrant
/// ```
///
/// Resolution evaluates each scope type independently — an organization
/// grant never implies access to projects below it. The only subsumption
/// is at the top: a System or matching Instance grant permits the whole
/// instance and suppresses lower-scope enumeration.
///
/// `Unknown` absorbs scope types this version does not know about; grants
/// carrying it are silently excluded from resolution rather than rejected,
/// so newer callers keep working against older cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// Cross-tenant system scope (machine credentials only)
    System,
    /// A whole tenant
    Instance,
    /// One organization within a tenant
    Organization,
    /// One project within a tenant
    Project,
    /// A project granted to another organization
    ProjectGrant,
    /// Scope type introduced after this version; never contributes
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeType::System => write!(f, "system"),
            ScopeType::Instance => write!(f, "instance"),
            ScopeType::Organization => write!(f, "organization"),
            ScopeType::Project => write!(f, "project"),
            ScopeType::ProjectGrant => write!(f, "project_grant"),
            ScopeType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lifecycle state of an organization
///
/// `Removed` is terminal. Active and Inactive are interchangeable through
/// deactivate/reactivate events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgState {
    /// No lifecycle event observed yet
    #[default]
    Unspecified,
    /// Organization is usable
    Active,
    /// Organization is deactivated but can be reactivated
    Inactive,
    /// Organization is removed; tombstone, no further mutation
    Removed,
}
