// Copyright (c) 2025 - Cowboy AI, Inc.
//! Structural Invariants of Permission Decisions
//!
//! For any generated static grant set, a decision must satisfy the
//! short-circuit rule, scope independence, and missing-identifier
//! exclusion.

use proptest::prelude::*;

use iam_core::domain::{Permission, ScopeType};
use iam_core::{check_static_grants, StaticGrant};

const TENANT: &str = "instance-1";
const PERMS: [&str; 4] = ["iam.read", "org.read", "project.read", "project_grant.read"];

fn scope_strategy() -> impl Strategy<Value = ScopeType> {
    prop_oneof![
        Just(ScopeType::System),
        Just(ScopeType::Instance),
        Just(ScopeType::Organization),
        Just(ScopeType::Project),
        Just(ScopeType::ProjectGrant),
        Just(ScopeType::Unknown),
    ]
}

fn id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(TENANT.to_string()),
        "[a-z]{1,4}-[0-9]",
    ]
}

fn grant_strategy() -> impl Strategy<Value = StaticGrant> {
    (
        scope_strategy(),
        id_strategy(),
        id_strategy(),
        proptest::collection::vec(0..PERMS.len(), 0..4),
    )
        .prop_map(|(scope, scope_id, object_id, perms)| StaticGrant {
            scope,
            scope_id,
            object_id,
            permissions: perms
                .into_iter()
                .map(|i| Permission::new(PERMS[i]).unwrap())
                .collect(),
        })
}

proptest! {
    /// Instance permission always suppresses the scoped sets.
    #[test]
    fn prop_short_circuit_monotonicity(
        grants in proptest::collection::vec(grant_strategy(), 0..8),
        perm_idx in 0..PERMS.len(),
    ) {
        let permission = Permission::new(PERMS[perm_idx]).unwrap();
        let decision = check_static_grants(TENANT, &grants, &permission);

        if decision.instance_permitted {
            prop_assert!(decision.org_ids.is_empty());
            prop_assert!(decision.project_ids.is_empty());
            prop_assert!(decision.project_grants.is_empty());
        }
    }

    /// Every contributed ID is traceable to a grant of that exact scope
    /// type carrying the queried permission, and no empty identifier
    /// ever contributes.
    #[test]
    fn prop_scope_independence_and_exclusion(
        grants in proptest::collection::vec(grant_strategy(), 0..8),
        perm_idx in 0..PERMS.len(),
    ) {
        let permission = Permission::new(PERMS[perm_idx]).unwrap();
        let decision = check_static_grants(TENANT, &grants, &permission);

        for org in &decision.org_ids {
            prop_assert!(!org.is_empty());
            prop_assert!(grants.iter().any(|g| g.scope == ScopeType::Organization
                && &g.scope_id == org
                && g.permissions.contains(&permission)));
        }
        for project in &decision.project_ids {
            prop_assert!(!project.is_empty());
            prop_assert!(grants.iter().any(|g| g.scope == ScopeType::Project
                && &g.scope_id == project
                && g.permissions.contains(&permission)));
        }
        for grant in &decision.project_grants {
            prop_assert!(!grant.project_id.is_empty() && !grant.grant_id.is_empty());
            prop_assert!(grants.iter().any(|g| g.scope == ScopeType::ProjectGrant
                && g.scope_id == grant.project_id
                && g.object_id == grant.grant_id
                && g.permissions.contains(&permission)));
        }
    }
}
