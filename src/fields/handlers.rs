// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event → Field Mapping
//!
//! [`field_ops`] is the pure function turning one event into the facts it
//! upserts and the facts it retracts. [`FieldProjection`] wraps it as a
//! projection feeding a shared [`FieldIndex`].
//!
//! # Fact vocabulary
//!
//! | object type                | object id | field name   | value      |
//! |----------------------------|-----------|--------------|------------|
//! | `role_permission`          | role      | `permission` | permission |
//! | `instance_member_role`     | user      | `instance_role` | role    |
//! | `org_member_role`          | user      | `org_role`   | role       |
//! | `project_member_role`      | user      | `project_role` | role     |
//! | `project_grant_member_role`| user      | grant id     | role       |
//! | `org`                      | org       | `name`/`domain` | value (unique) |
//! | `user`                     | user      | `username`   | value (unique) |
//! | `project`                  | project   | `name`       | value      |
//! | `project_grant`            | grant     | `granted_org`| org id     |

use std::sync::Arc;

use serde_json::json;

use crate::domain::Role;
use crate::errors::CoreResult;
use crate::events::{
    AggregateType, Event, EventPayload, InstanceEvent, OrgEvent, PermissionEvent, ProjectEvent,
    UserEvent,
};
use crate::projection::{EventFilter, Projection};

use super::index::FieldIndex;
use super::{
    Field, FieldFilter, FieldOp, FIELD_INSTANCE_ROLE, FIELD_ORG_ROLE, FIELD_PERMISSION,
    FIELD_PROJECT_ROLE, OBJECT_INSTANCE_MEMBER, OBJECT_ORG_MEMBER, OBJECT_PROJECT_GRANT_MEMBER,
    OBJECT_PROJECT_MEMBER, OBJECT_ROLE_PERMISSION,
};

/// Build a fact carrying the event's stream coordinates
fn field(
    event: &Event,
    object_type: &str,
    object_id: &str,
    field_name: &str,
    value: serde_json::Value,
    value_must_be_unique: bool,
) -> Field {
    Field {
        tenant_id: event.tenant_id.clone(),
        resource_owner: event.resource_owner.clone(),
        aggregate_type: event.aggregate_type(),
        aggregate_id: event.aggregate_id.clone(),
        object_type: object_type.to_string(),
        object_id: object_id.to_string(),
        field_name: field_name.to_string(),
        value,
        value_must_be_unique,
        revision: event.sequence,
    }
}

/// Retraction of one object's facts under the event's aggregate
///
/// Guarded by the event's sequence: a replayed retraction never drops
/// facts a later event of the same stream has written since.
fn retract_object(event: &Event, object_type: &str, object_id: &str) -> FieldOp {
    FieldOp::Remove(
        FieldFilter::tenant(&event.tenant_id)
            .with_aggregate_type(event.aggregate_type())
            .with_aggregate_id(&event.aggregate_id)
            .with_object_type(object_type)
            .with_object_id(object_id)
            .with_up_to_revision(event.sequence),
    )
}

/// Replace a member's role facts: retract all, then set one per role
fn member_ops(
    event: &Event,
    object_type: &str,
    field_name: &str,
    user_id: &str,
    roles: &[Role],
) -> Vec<FieldOp> {
    let mut ops = vec![retract_object(event, object_type, user_id)];
    for role in roles {
        ops.push(FieldOp::Set(field(
            event,
            object_type,
            user_id,
            field_name,
            json!(role.as_str()),
            false,
        )));
    }
    ops
}

/// Map one event to the field operations it implies
///
/// Pure function: same event, same operations. Events with no fact
/// side effects map to an empty vector.
pub fn field_ops(event: &Event) -> Vec<FieldOp> {
    match &event.payload {
        EventPayload::Instance(e) => instance_ops(event, e),
        EventPayload::Org(e) => org_ops(event, e),
        EventPayload::User(e) => user_ops(event, e),
        EventPayload::Project(e) => project_ops(event, e),
        EventPayload::Permission(e) => permission_ops(event, e),
    }
}

fn instance_ops(event: &Event, e: &InstanceEvent) -> Vec<FieldOp> {
    match e {
        InstanceEvent::MemberAdded { user_id, roles }
        | InstanceEvent::MemberChanged { user_id, roles } => {
            member_ops(event, OBJECT_INSTANCE_MEMBER, FIELD_INSTANCE_ROLE, user_id, roles)
        }
        InstanceEvent::MemberRemoved { user_id } => {
            vec![retract_object(event, OBJECT_INSTANCE_MEMBER, user_id)]
        }
        // Tenant removal retracts every fact of the tenant.
        InstanceEvent::Removed => vec![FieldOp::Remove(FieldFilter::tenant(&event.tenant_id))],
        _ => Vec::new(),
    }
}

fn org_ops(event: &Event, e: &OrgEvent) -> Vec<FieldOp> {
    match e {
        OrgEvent::Added { name } => vec![FieldOp::Set(field(
            event,
            "org",
            &event.aggregate_id,
            "name",
            json!(name),
            true,
        ))],
        OrgEvent::Changed { name } => vec![
            // Release the old name before claiming the new one.
            FieldOp::Remove(
                FieldFilter::tenant(&event.tenant_id)
                    .with_aggregate_type(AggregateType::Org)
                    .with_aggregate_id(&event.aggregate_id)
                    .with_object_type("org")
                    .with_field_name("name")
                    .with_up_to_revision(event.sequence),
            ),
            FieldOp::Set(field(
                event,
                "org",
                &event.aggregate_id,
                "name",
                json!(name),
                true,
            )),
        ],
        OrgEvent::DomainVerified { domain } => vec![FieldOp::Set(field(
            event,
            "org",
            &event.aggregate_id,
            "domain",
            json!(domain),
            true,
        ))],
        OrgEvent::DomainRemoved { domain } => vec![FieldOp::Remove(
            FieldFilter::tenant(&event.tenant_id)
                .with_aggregate_type(AggregateType::Org)
                .with_aggregate_id(&event.aggregate_id)
                .with_field_name("domain")
                .with_value(json!(domain))
                .with_up_to_revision(event.sequence),
        )],
        OrgEvent::MemberAdded { user_id, roles }
        | OrgEvent::MemberChanged { user_id, roles } => {
            member_ops(event, OBJECT_ORG_MEMBER, FIELD_ORG_ROLE, user_id, roles)
        }
        OrgEvent::MemberRemoved { user_id } => {
            vec![retract_object(event, OBJECT_ORG_MEMBER, user_id)]
        }
        OrgEvent::Removed => vec![
            // The org's own facts plus everything owned by it (cascade).
            FieldOp::Remove(
                FieldFilter::tenant(&event.tenant_id)
                    .with_aggregate_type(AggregateType::Org)
                    .with_aggregate_id(&event.aggregate_id),
            ),
            FieldOp::Remove(
                FieldFilter::tenant(&event.tenant_id).with_resource_owner(&event.aggregate_id),
            ),
        ],
        _ => Vec::new(),
    }
}

fn user_ops(event: &Event, e: &UserEvent) -> Vec<FieldOp> {
    match e {
        UserEvent::Added { username } => vec![FieldOp::Set(field(
            event,
            "user",
            &event.aggregate_id,
            "username",
            json!(username),
            true,
        ))],
        UserEvent::UsernameChanged { username } => vec![
            FieldOp::Remove(
                FieldFilter::tenant(&event.tenant_id)
                    .with_aggregate_type(AggregateType::User)
                    .with_aggregate_id(&event.aggregate_id)
                    .with_field_name("username")
                    .with_up_to_revision(event.sequence),
            ),
            FieldOp::Set(field(
                event,
                "user",
                &event.aggregate_id,
                "username",
                json!(username),
                true,
            )),
        ],
        UserEvent::Removed => vec![FieldOp::Remove(
            FieldFilter::tenant(&event.tenant_id)
                .with_aggregate_type(AggregateType::User)
                .with_aggregate_id(&event.aggregate_id),
        )],
    }
}

fn project_ops(event: &Event, e: &ProjectEvent) -> Vec<FieldOp> {
    match e {
        ProjectEvent::Added { name } => vec![FieldOp::Set(field(
            event,
            "project",
            &event.aggregate_id,
            "name",
            json!(name),
            false,
        ))],
        ProjectEvent::Changed { name } => vec![
            retract_object(event, "project", &event.aggregate_id),
            FieldOp::Set(field(
                event,
                "project",
                &event.aggregate_id,
                "name",
                json!(name),
                false,
            )),
        ],
        ProjectEvent::Removed => vec![FieldOp::Remove(
            FieldFilter::tenant(&event.tenant_id)
                .with_aggregate_type(AggregateType::Project)
                .with_aggregate_id(&event.aggregate_id),
        )],
        ProjectEvent::GrantAdded {
            grant_id,
            granted_org_id,
        } => vec![FieldOp::Set(field(
            event,
            "project_grant",
            grant_id,
            "granted_org",
            json!(granted_org_id),
            false,
        ))],
        ProjectEvent::GrantRemoved { grant_id } => vec![
            retract_object(event, "project_grant", grant_id),
            // Grant member facts carry the grant id as field name.
            FieldOp::Remove(
                FieldFilter::tenant(&event.tenant_id)
                    .with_aggregate_type(AggregateType::Project)
                    .with_aggregate_id(&event.aggregate_id)
                    .with_object_type(OBJECT_PROJECT_GRANT_MEMBER)
                    .with_field_name(grant_id)
                    .with_up_to_revision(event.sequence),
            ),
        ],
        ProjectEvent::MemberAdded { user_id, roles }
        | ProjectEvent::MemberChanged { user_id, roles } => {
            member_ops(event, OBJECT_PROJECT_MEMBER, FIELD_PROJECT_ROLE, user_id, roles)
        }
        ProjectEvent::MemberRemoved { user_id } => {
            vec![retract_object(event, OBJECT_PROJECT_MEMBER, user_id)]
        }
        ProjectEvent::GrantMemberAdded {
            grant_id,
            user_id,
            roles,
        } => {
            // Retract only this grant's facts; the user may be a member
            // of other grants on the same project.
            let mut ops = vec![FieldOp::Remove(
                FieldFilter::tenant(&event.tenant_id)
                    .with_aggregate_type(AggregateType::Project)
                    .with_aggregate_id(&event.aggregate_id)
                    .with_object_type(OBJECT_PROJECT_GRANT_MEMBER)
                    .with_object_id(user_id)
                    .with_field_name(grant_id)
                    .with_up_to_revision(event.sequence),
            )];
            for role in roles {
                ops.push(FieldOp::Set(field(
                    event,
                    OBJECT_PROJECT_GRANT_MEMBER,
                    user_id,
                    grant_id,
                    json!(role.as_str()),
                    false,
                )));
            }
            ops
        }
        ProjectEvent::GrantMemberRemoved { grant_id, user_id } => vec![FieldOp::Remove(
            FieldFilter::tenant(&event.tenant_id)
                .with_aggregate_type(AggregateType::Project)
                .with_aggregate_id(&event.aggregate_id)
                .with_object_type(OBJECT_PROJECT_GRANT_MEMBER)
                .with_object_id(user_id)
                .with_field_name(grant_id)
                .with_up_to_revision(event.sequence),
        )],
    }
}

fn permission_ops(event: &Event, e: &PermissionEvent) -> Vec<FieldOp> {
    match e {
        PermissionEvent::RolePermissionAdded { role, permission } => {
            vec![FieldOp::Set(field(
                event,
                OBJECT_ROLE_PERMISSION,
                role.as_str(),
                FIELD_PERMISSION,
                json!(permission.as_str()),
                false,
            ))]
        }
        PermissionEvent::RolePermissionRemoved { role, permission } => {
            vec![FieldOp::Remove(
                FieldFilter::tenant(&event.tenant_id)
                    .with_aggregate_type(AggregateType::Permission)
                    .with_aggregate_id(&event.aggregate_id)
                    .with_object_type(OBJECT_ROLE_PERMISSION)
                    .with_object_id(role.as_str())
                    .with_field_name(FIELD_PERMISSION)
                    .with_value(json!(permission.as_str()))
                    .with_up_to_revision(event.sequence),
            )]
        }
    }
}

/// Projection maintaining a shared [`FieldIndex`]
///
/// Declares interest in every aggregate type: the index is the one read
/// model that sees the whole event space.
pub struct FieldProjection {
    index: Arc<FieldIndex>,
}

impl FieldProjection {
    /// Create a projection feeding the given index
    pub fn new(index: Arc<FieldIndex>) -> Self {
        Self { index }
    }

    /// The index this projection maintains
    pub fn index(&self) -> Arc<FieldIndex> {
        Arc::clone(&self.index)
    }
}

impl Projection for FieldProjection {
    fn name(&self) -> &'static str {
        "fields"
    }

    fn filters(&self) -> Vec<EventFilter> {
        vec![
            EventFilter::aggregate(AggregateType::Instance),
            EventFilter::aggregate(AggregateType::Org),
            EventFilter::aggregate(AggregateType::User),
            EventFilter::aggregate(AggregateType::Project),
            EventFilter::aggregate(AggregateType::Permission),
        ]
    }

    fn reduce(&mut self, events: &[Event]) -> CoreResult<()> {
        for event in events {
            let ops = field_ops(event);
            if !ops.is_empty() {
                self.index.apply(&ops)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Permission;
    use chrono::Utc;
    use uuid::Uuid;

    fn event(
        tenant: &str,
        aggregate_id: &str,
        resource_owner: &str,
        sequence: u64,
        payload: EventPayload,
    ) -> Event {
        Event {
            event_id: Uuid::now_v7(),
            tenant_id: tenant.to_string(),
            aggregate_id: aggregate_id.to_string(),
            resource_owner: resource_owner.to_string(),
            sequence,
            created_at: Utc::now(),
            editor: "test".to_string(),
            payload,
        }
    }

    #[test]
    fn test_member_added_sets_one_fact_per_role() {
        let e = event(
            "t1",
            "org-1",
            "org-1",
            2,
            EventPayload::Org(OrgEvent::MemberAdded {
                user_id: "user-1".to_string(),
                roles: vec![Role::new("ORG_OWNER").unwrap(), Role::new("ORG_ADMIN").unwrap()],
            }),
        );

        let ops = field_ops(&e);
        // One retraction, then one set per role.
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], FieldOp::Remove(_)));
        assert!(matches!(ops[1], FieldOp::Set(_)));
    }

    #[test]
    fn test_role_revoked_retracts_membership() {
        let index = Arc::new(FieldIndex::new());
        let mut projection = FieldProjection::new(Arc::clone(&index));

        projection
            .reduce(&[
                event(
                    "t1",
                    "org-1",
                    "org-1",
                    1,
                    EventPayload::Org(OrgEvent::MemberAdded {
                        user_id: "user-1".to_string(),
                        roles: vec![Role::new("ORG_OWNER").unwrap()],
                    }),
                ),
                event(
                    "t1",
                    "org-1",
                    "org-1",
                    2,
                    EventPayload::Org(OrgEvent::MemberRemoved {
                        user_id: "user-1".to_string(),
                    }),
                ),
            ])
            .unwrap();

        let members = index.search(
            &FieldFilter::tenant("t1").with_object_type(OBJECT_ORG_MEMBER),
        );
        assert!(members.is_empty());
    }

    #[test]
    fn test_replayed_retraction_keeps_newer_membership() {
        let index = Arc::new(FieldIndex::new());
        let mut projection = FieldProjection::new(Arc::clone(&index));

        let removed = event(
            "t1",
            "org-1",
            "org-1",
            2,
            EventPayload::Org(OrgEvent::MemberRemoved {
                user_id: "user-1".to_string(),
            }),
        );
        let re_added = event(
            "t1",
            "org-1",
            "org-1",
            3,
            EventPayload::Org(OrgEvent::MemberAdded {
                user_id: "user-1".to_string(),
                roles: vec![Role::new("ORG_OWNER").unwrap()],
            }),
        );

        // A worker replaying the older removal after the re-add must not
        // drop the newer membership.
        projection.reduce(std::slice::from_ref(&re_added)).unwrap();
        projection.reduce(std::slice::from_ref(&removed)).unwrap();

        let members = index.search(
            &FieldFilter::tenant("t1").with_object_type(OBJECT_ORG_MEMBER),
        );
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].revision, 3);
    }

    #[test]
    fn test_org_removed_cascades_into_owned_facts() {
        let index = Arc::new(FieldIndex::new());
        let mut projection = FieldProjection::new(Arc::clone(&index));

        projection
            .reduce(&[
                event(
                    "t1",
                    "org-1",
                    "org-1",
                    1,
                    EventPayload::Org(OrgEvent::Added {
                        name: "ACME".to_string(),
                    }),
                ),
                // Project owned by the org.
                event(
                    "t1",
                    "proj-1",
                    "org-1",
                    1,
                    EventPayload::Project(ProjectEvent::MemberAdded {
                        user_id: "user-1".to_string(),
                        roles: vec![Role::new("PROJECT_OWNER").unwrap()],
                    }),
                ),
                event(
                    "t1",
                    "org-1",
                    "org-1",
                    2,
                    EventPayload::Org(OrgEvent::Removed),
                ),
            ])
            .unwrap();

        assert!(index.is_empty());
        // The released name is claimable again.
        assert!(!index.is_claimed("t1", "name", &json!("ACME")));
    }

    #[test]
    fn test_role_permission_mapping_round_trip() {
        let index = Arc::new(FieldIndex::new());
        let mut projection = FieldProjection::new(Arc::clone(&index));

        let added = event(
            "t1",
            "t1",
            "t1",
            1,
            EventPayload::Permission(PermissionEvent::RolePermissionAdded {
                role: Role::new("ORG_OWNER").unwrap(),
                permission: Permission::new("org.read").unwrap(),
            }),
        );
        projection.reduce(std::slice::from_ref(&added)).unwrap();

        let roles = index.lookup(
            "t1",
            Some(AggregateType::Permission),
            None,
            FIELD_PERMISSION,
            &json!("org.read"),
        );
        assert_eq!(roles, vec!["ORG_OWNER".to_string()]);

        let removed = event(
            "t1",
            "t1",
            "t1",
            2,
            EventPayload::Permission(PermissionEvent::RolePermissionRemoved {
                role: Role::new("ORG_OWNER").unwrap(),
                permission: Permission::new("org.read").unwrap(),
            }),
        );
        projection.reduce(std::slice::from_ref(&removed)).unwrap();
        assert!(index.is_empty());
    }
}
