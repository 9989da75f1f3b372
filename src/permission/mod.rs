// Copyright (c) 2025 - Cowboy AI, Inc.
//! Permission Resolution Engine
//!
//! Read-only query layer answering "which scopes grant permission P to
//! this caller" from two inputs: caller-supplied static grants and the
//! fact index. Resolution never mutates anything and never fails on
//! "just no permission"; a denied caller gets an all-empty decision.
//!
//! # Decision Shape
//!
//! ```text
//! System / Instance grant ──> instance_permitted = true
//!                             (lower scopes suppressed)
//! Organization grant    ──> org_ids
//! Project grant         ──> project_ids
//! ProjectGrant grant    ──> project_grants (project_id, grant_id)
//! ```
//!
//! Scopes are evaluated independently: an organization grant never
//! implies access to the projects under it.
//!
//! # Module Organization
//!
//! - [`grants`] - static grant evaluation ([`check_static_grants`])
//! - [`resolver`] - fact-index-backed user resolution ([`PermissionResolver`])

pub mod grants;
pub mod resolver;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Permission, ScopeType};

pub use grants::check_static_grants;
pub use resolver::PermissionResolver;

/// Caller-supplied permission assertion, decided out-of-band
///
/// Static grants represent credentials (machine users, system tokens)
/// whose authorization is not persisted in the fact index. Empty
/// identifiers mark a grant that cannot contribute; they are excluded
/// silently, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticGrant {
    /// Scope the grant applies to
    pub scope: ScopeType,
    /// Identifier of the scope (instance, org, project)
    #[serde(default)]
    pub scope_id: String,
    /// Secondary identifier, used by project-grant scopes (the grant ID)
    #[serde(default)]
    pub object_id: String,
    /// Permissions the credential asserts
    pub permissions: Vec<Permission>,
}

impl StaticGrant {
    /// Build a grant without identifiers (System scope)
    pub fn system(permissions: Vec<Permission>) -> Self {
        Self {
            scope: ScopeType::System,
            scope_id: String::new(),
            object_id: String::new(),
            permissions,
        }
    }

    /// Build a grant scoped to one identifier
    pub fn scoped(
        scope: ScopeType,
        scope_id: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            scope,
            scope_id: scope_id.into(),
            object_id: String::new(),
            permissions,
        }
    }

    /// Build a project-grant scoped grant
    pub fn project_grant(
        project_id: impl Into<String>,
        grant_id: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            scope: ScopeType::ProjectGrant,
            scope_id: project_id.into(),
            object_id: grant_id.into(),
            permissions,
        }
    }

    pub(crate) fn grants(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }
}

/// A `(project, grant)` pair permitted at project-grant scope
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectGrantRef {
    /// Project the grant belongs to
    pub project_id: String,
    /// Grant within the project
    pub grant_id: String,
}

impl ProjectGrantRef {
    /// Pair constructor
    pub fn new(project_id: impl Into<String>, grant_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            grant_id: grant_id.into(),
        }
    }
}

/// Result of one `(tenant, permission)` resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    /// Permission holds at instance scope; lower sets are empty then
    pub instance_permitted: bool,
    /// Organizations where the permission holds
    pub org_ids: BTreeSet<String>,
    /// Projects where the permission holds
    pub project_ids: BTreeSet<String>,
    /// Project grants where the permission holds
    pub project_grants: BTreeSet<ProjectGrantRef>,
}

impl PermissionDecision {
    /// Decision denying everything
    pub fn denied() -> Self {
        Self::default()
    }

    /// Decision permitting the whole instance
    pub fn instance() -> Self {
        Self {
            instance_permitted: true,
            ..Self::default()
        }
    }

    /// Whether nothing is permitted anywhere
    pub fn is_denied(&self) -> bool {
        !self.instance_permitted
            && self.org_ids.is_empty()
            && self.project_ids.is_empty()
            && self.project_grants.is_empty()
    }

    /// Union of two decisions
    ///
    /// Instance permission subsumes the scoped sets, so when either side
    /// is instance-permitted the merged decision carries empty sets.
    pub fn merge(mut self, other: Self) -> Self {
        if self.instance_permitted || other.instance_permitted {
            return Self::instance();
        }
        self.org_ids.extend(other.org_ids);
        self.project_ids.extend(other.project_ids);
        self.project_grants.extend(other.project_grants);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn perm(name: &str) -> Permission {
        Permission::new(name).unwrap()
    }

    #[test]
    fn test_merge_short_circuits_on_instance() {
        let mut scoped = PermissionDecision::denied();
        scoped.org_ids.insert("org-1".to_string());

        let merged = scoped.merge(PermissionDecision::instance());
        assert!(merged.instance_permitted);
        assert!(merged.org_ids.is_empty());
    }

    #[test]
    fn test_merge_unions_scoped_sets() {
        let mut a = PermissionDecision::denied();
        a.org_ids.insert("org-1".to_string());
        a.project_ids.insert("proj-1".to_string());
        let mut b = PermissionDecision::denied();
        b.org_ids.insert("org-2".to_string());
        b.project_grants
            .insert(ProjectGrantRef::new("proj-1", "grant-1"));

        let merged = a.merge(b);
        assert!(!merged.instance_permitted);
        assert_eq!(merged.org_ids.len(), 2);
        assert_eq!(merged.project_ids.len(), 1);
        assert_eq!(merged.project_grants.len(), 1);
    }

    #[test]
    fn test_static_grant_constructors() {
        let grant = StaticGrant::project_grant("proj-1", "grant-1", vec![perm("project.read")]);
        assert_eq!(grant.scope, ScopeType::ProjectGrant);
        assert_eq!(grant.scope_id, "proj-1");
        assert_eq!(grant.object_id, "grant-1");
        assert!(grant.grants(&perm("project.read")));
        assert!(!grant.grants(&perm("project.write")));
    }
}
