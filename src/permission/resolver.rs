// Copyright (c) 2025 - Cowboy AI, Inc.
//! User Permission Resolution
//!
//! Resolves a user's permission against the fact index: role-permission
//! facts name the roles granting the permission, membership facts name
//! the scopes where the user holds those roles. The result is unioned
//! with any static grants the caller holds alongside the session.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::json;

use crate::domain::Permission;
use crate::events::AggregateType;
use crate::fields::{
    FieldFilter, FieldIndex, FIELD_INSTANCE_ROLE, FIELD_ORG_ROLE, FIELD_PERMISSION,
    FIELD_PROJECT_ROLE, OBJECT_INSTANCE_MEMBER, OBJECT_ORG_MEMBER, OBJECT_PROJECT_GRANT_MEMBER,
    OBJECT_PROJECT_MEMBER, OBJECT_ROLE_PERMISSION,
};

use super::{check_static_grants, PermissionDecision, ProjectGrantRef, StaticGrant};

/// Fact-index-backed permission resolver
///
/// Resolution is read-only and synchronous; it holds no locks across
/// calls and mutates nothing, so cancellation is simply dropping the
/// call.
#[derive(Clone)]
pub struct PermissionResolver {
    index: Arc<FieldIndex>,
}

impl PermissionResolver {
    /// Create a resolver over a fact index
    pub fn new(index: Arc<FieldIndex>) -> Self {
        Self { index }
    }

    /// Resolve one `(tenant, user, permission)` query
    ///
    /// An empty `user_id` defers entirely to the static grants. The
    /// membership result and the static grant result are unioned;
    /// `filter_org` then narrows the scoped sets to one organization,
    /// or empties them when that organization is not in the unfiltered
    /// result. `instance_permitted` is unaffected by the filter.
    pub fn resolve_user_permission(
        &self,
        tenant_id: &str,
        user_id: &str,
        permission: &Permission,
        filter_org: Option<&str>,
        grants: &[StaticGrant],
    ) -> PermissionDecision {
        let static_decision = check_static_grants(tenant_id, grants, permission);

        let mut owners: HashMap<String, String> = HashMap::new();
        let mut grant_owners: HashMap<ProjectGrantRef, String> = HashMap::new();

        let mut decision = if user_id.is_empty() {
            static_decision
        } else {
            self.resolve_memberships(tenant_id, user_id, permission, &mut owners, &mut grant_owners)
                .merge(static_decision)
        };

        if let Some(org) = filter_org {
            if !decision.instance_permitted {
                if decision.org_ids.contains(org) {
                    decision.org_ids.retain(|id| id == org);
                    // Project results whose owning organization is known
                    // and differs are dropped with the filtered orgs.
                    decision
                        .project_ids
                        .retain(|p| owners.get(p).map_or(true, |o| o == org));
                    decision
                        .project_grants
                        .retain(|g| grant_owners.get(g).map_or(true, |o| o == org));
                } else {
                    decision.org_ids.clear();
                    decision.project_ids.clear();
                    decision.project_grants.clear();
                }
            }
        }

        decision
    }

    /// Roles granting `permission` in this tenant
    fn granting_roles(&self, tenant_id: &str, permission: &Permission) -> BTreeSet<String> {
        self.index
            .search(
                &FieldFilter::tenant(tenant_id)
                    .with_object_type(OBJECT_ROLE_PERMISSION)
                    .with_field_name(FIELD_PERMISSION)
                    .with_value(json!(permission.as_str())),
            )
            .into_iter()
            .map(|f| f.object_id)
            .collect()
    }

    fn resolve_memberships(
        &self,
        tenant_id: &str,
        user_id: &str,
        permission: &Permission,
        owners: &mut HashMap<String, String>,
        grant_owners: &mut HashMap<ProjectGrantRef, String>,
    ) -> PermissionDecision {
        let roles = self.granting_roles(tenant_id, permission);
        if roles.is_empty() {
            return PermissionDecision::denied();
        }

        let mut decision = PermissionDecision::denied();
        for role in &roles {
            let role_value = json!(role);

            let instance = self.index.search(
                &FieldFilter::tenant(tenant_id)
                    .with_aggregate_type(AggregateType::Instance)
                    .with_object_type(OBJECT_INSTANCE_MEMBER)
                    .with_object_id(user_id)
                    .with_field_name(FIELD_INSTANCE_ROLE)
                    .with_value(role_value.clone()),
            );
            if !instance.is_empty() {
                // Instance scope subsumes everything below it.
                return PermissionDecision::instance();
            }

            for fact in self.index.search(
                &FieldFilter::tenant(tenant_id)
                    .with_aggregate_type(AggregateType::Org)
                    .with_object_type(OBJECT_ORG_MEMBER)
                    .with_object_id(user_id)
                    .with_field_name(FIELD_ORG_ROLE)
                    .with_value(role_value.clone()),
            ) {
                decision.org_ids.insert(fact.aggregate_id);
            }

            for fact in self.index.search(
                &FieldFilter::tenant(tenant_id)
                    .with_aggregate_type(AggregateType::Project)
                    .with_object_type(OBJECT_PROJECT_MEMBER)
                    .with_object_id(user_id)
                    .with_field_name(FIELD_PROJECT_ROLE)
                    .with_value(role_value.clone()),
            ) {
                owners.insert(fact.aggregate_id.clone(), fact.resource_owner.clone());
                decision.project_ids.insert(fact.aggregate_id);
            }

            // Grant member facts carry the grant ID as the field name.
            for fact in self.index.search(
                &FieldFilter::tenant(tenant_id)
                    .with_aggregate_type(AggregateType::Project)
                    .with_object_type(OBJECT_PROJECT_GRANT_MEMBER)
                    .with_object_id(user_id)
                    .with_value(role_value),
            ) {
                let grant = ProjectGrantRef::new(&fact.aggregate_id, &fact.field_name);
                grant_owners.insert(grant.clone(), fact.resource_owner.clone());
                decision.project_grants.insert(grant);
            }
        }
        decision
    }
}
