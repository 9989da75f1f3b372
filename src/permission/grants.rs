// Copyright (c) 2025 - Cowboy AI, Inc.
//! Static Grant Evaluation
//!
//! Pure evaluation of caller-supplied grants against one permission.
//! No fact index involved; this path serves machine and system
//! credentials whose authorization was decided out-of-band.

use crate::domain::{Permission, ScopeType};

use super::{PermissionDecision, ProjectGrantRef, StaticGrant};

/// Evaluate static grants for one `(tenant, permission)` pair
///
/// Instance scope is checked first: a `System` grant, or an `Instance`
/// grant whose scope ID matches the tenant, short-circuits with an
/// instance-wide decision and empty scoped sets. Otherwise each grant
/// contributes to the set of its exact scope type only. Grants with a
/// missing required identifier, an unknown scope type, or a tenant
/// mismatch are excluded silently.
pub fn check_static_grants(
    tenant_id: &str,
    grants: &[StaticGrant],
    permission: &Permission,
) -> PermissionDecision {
    let instance_permitted = grants.iter().any(|grant| {
        grant.grants(permission)
            && match grant.scope {
                ScopeType::System => true,
                ScopeType::Instance => grant.scope_id == tenant_id,
                _ => false,
            }
    });
    if instance_permitted {
        return PermissionDecision::instance();
    }

    let mut decision = PermissionDecision::denied();
    for grant in grants {
        if !grant.grants(permission) {
            continue;
        }
        match grant.scope {
            ScopeType::Organization if !grant.scope_id.is_empty() => {
                decision.org_ids.insert(grant.scope_id.clone());
            }
            ScopeType::Project if !grant.scope_id.is_empty() => {
                decision.project_ids.insert(grant.scope_id.clone());
            }
            ScopeType::ProjectGrant
                if !grant.scope_id.is_empty() && !grant.object_id.is_empty() =>
            {
                decision
                    .project_grants
                    .insert(ProjectGrantRef::new(&grant.scope_id, &grant.object_id));
            }
            _ => {}
        }
    }
    decision
}
