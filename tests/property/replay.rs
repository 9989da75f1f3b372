// Copyright (c) 2025 - Cowboy AI, Inc.
//! Replay-Equivalence and Tenant-Isolation Properties
//!
//! For any generated event history, reducing the complete ordered
//! history once must produce the same state as reducing it one event at
//! a time, and no tenant-scoped query may ever see another tenant's
//! data.

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use iam_core::domain::Role;
use iam_core::events::{AggregateType, Event, EventPayload, OrgEvent, UserEvent};
use iam_core::fields::FieldFilter;
use iam_core::projection::{LoginNameProjection, OrgProjection, Projection};
use iam_core::{FieldIndex, FieldProjection};

const ORGS: usize = 3;
const USERS: usize = 3;
const ROLES: [&str; 3] = ["ORG_OWNER", "ORG_ADMIN", "ORG_VIEWER"];

/// One abstract step of a generated history
#[derive(Debug, Clone)]
enum Step {
    OrgAdded(usize),
    OrgDeactivated(usize),
    OrgReactivated(usize),
    OrgRemoved(usize),
    MemberAdded(usize, usize, usize),
    MemberRemoved(usize, usize),
    DomainAdded(usize, usize),
    DomainVerified(usize, usize),
    DomainPrimary(usize, usize),
    UserAdded(usize, usize),
    UsernameChanged(usize),
}

fn step_strategy(with_org_removal: bool) -> impl Strategy<Value = Step> {
    let base = prop_oneof![
        (0..ORGS).prop_map(Step::OrgAdded),
        (0..ORGS).prop_map(Step::OrgDeactivated),
        (0..ORGS).prop_map(Step::OrgReactivated),
        (0..ORGS, 0..USERS, 0..ROLES.len()).prop_map(|(o, u, r)| Step::MemberAdded(o, u, r)),
        (0..ORGS, 0..USERS).prop_map(|(o, u)| Step::MemberRemoved(o, u)),
        (0..ORGS, 0..3usize).prop_map(|(o, d)| Step::DomainAdded(o, d)),
        (0..ORGS, 0..3usize).prop_map(|(o, d)| Step::DomainVerified(o, d)),
        (0..ORGS, 0..3usize).prop_map(|(o, d)| Step::DomainPrimary(o, d)),
        (0..USERS, 0..ORGS).prop_map(|(u, o)| Step::UserAdded(u, o)),
        (0..USERS).prop_map(Step::UsernameChanged),
    ];
    if with_org_removal {
        prop_oneof![base, (0..ORGS).prop_map(Step::OrgRemoved)].boxed()
    } else {
        base.boxed()
    }
}

/// Turn abstract steps into a valid history: per-stream sequences are
/// assigned in order, and generated names are unique by construction so
/// no uniqueness claim ever collides.
fn materialize(tenant: &str, steps: &[Step]) -> Vec<Event> {
    let mut sequences: HashMap<(AggregateType, String), u64> = HashMap::new();
    let mut counter = 0u64;
    let mut events = Vec::with_capacity(steps.len());

    for step in steps {
        counter += 1;
        let (aggregate_id, resource_owner, payload) = match step {
            Step::OrgAdded(o) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::Added {
                    name: format!("{tenant}-org-{o}-name-{counter}"),
                }),
            ),
            Step::OrgDeactivated(o) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::Deactivated),
            ),
            Step::OrgReactivated(o) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::Reactivated),
            ),
            Step::OrgRemoved(o) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::Removed),
            ),
            Step::MemberAdded(o, u, r) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::MemberAdded {
                    user_id: format!("user-{u}"),
                    roles: vec![Role::new(ROLES[*r]).unwrap()],
                }),
            ),
            Step::MemberRemoved(o, u) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::MemberRemoved {
                    user_id: format!("user-{u}"),
                }),
            ),
            Step::DomainAdded(o, d) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::DomainAdded {
                    domain: format!("{tenant}-org{o}-d{d}.example"),
                }),
            ),
            Step::DomainVerified(o, d) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::DomainVerified {
                    domain: format!("{tenant}-org{o}-d{d}.example"),
                }),
            ),
            Step::DomainPrimary(o, d) => (
                format!("org-{o}"),
                format!("org-{o}"),
                EventPayload::Org(OrgEvent::DomainPrimarySet {
                    domain: format!("{tenant}-org{o}-d{d}.example"),
                }),
            ),
            Step::UserAdded(u, o) => (
                format!("user-{u}"),
                format!("org-{o}"),
                EventPayload::User(UserEvent::Added {
                    username: format!("{tenant}-user-{u}-{counter}"),
                }),
            ),
            Step::UsernameChanged(u) => (
                format!("user-{u}"),
                // Owner is only meaningful on the added event.
                format!("user-{u}"),
                EventPayload::User(UserEvent::UsernameChanged {
                    username: format!("{tenant}-user-{u}-{counter}"),
                }),
            ),
        };

        let key = (payload.aggregate_type(), aggregate_id.clone());
        let sequence = sequences.entry(key).or_insert(0);
        *sequence += 1;

        events.push(Event {
            event_id: Uuid::now_v7(),
            tenant_id: tenant.to_string(),
            aggregate_id,
            resource_owner,
            sequence: *sequence,
            created_at: Utc::now(),
            editor: "prop".to_string(),
            payload,
        });
    }
    events
}

proptest! {
    /// Full replay of an org history equals event-at-a-time application.
    #[test]
    fn prop_org_projection_replay_equivalence(
        steps in proptest::collection::vec(step_strategy(true), 0..40)
    ) {
        let events = materialize("t1", &steps);

        let mut full = OrgProjection::new();
        full.reduce(&events).unwrap();

        let mut incremental = OrgProjection::new();
        for event in &events {
            incremental.reduce(std::slice::from_ref(event)).unwrap();
        }

        prop_assert_eq!(full.tenant_orgs("t1"), incremental.tenant_orgs("t1"));
    }

    /// Login-name resolution is replay-equivalent for histories where
    /// organizations outlive their users (cross-stream order between a
    /// user's creation and its org's removal is otherwise undefined).
    #[test]
    fn prop_login_names_replay_equivalence(
        steps in proptest::collection::vec(step_strategy(false), 0..40)
    ) {
        let events = materialize("t1", &steps);

        let mut full = LoginNameProjection::new();
        full.reduce(&events).unwrap();

        let mut incremental = LoginNameProjection::new();
        for event in &events {
            incremental.reduce(std::slice::from_ref(event)).unwrap();
        }

        for u in 0..USERS {
            let user = format!("user-{u}");
            prop_assert_eq!(
                full.login_names("t1", &user),
                incremental.login_names("t1", &user)
            );
        }
    }

    /// The field index is replay-equivalent and never leaks across tenants.
    #[test]
    fn prop_field_index_replay_and_isolation(
        steps_a in proptest::collection::vec(step_strategy(true), 0..30),
        steps_b in proptest::collection::vec(step_strategy(true), 0..30),
    ) {
        // Interleave two tenants' histories.
        let mut events = materialize("tenant-a", &steps_a);
        events.extend(materialize("tenant-b", &steps_b));

        let full_index = std::sync::Arc::new(FieldIndex::new());
        let mut full = FieldProjection::new(std::sync::Arc::clone(&full_index));
        full.reduce(&events).unwrap();

        let incremental_index = std::sync::Arc::new(FieldIndex::new());
        let mut incremental = FieldProjection::new(std::sync::Arc::clone(&incremental_index));
        for event in &events {
            incremental.reduce(std::slice::from_ref(event)).unwrap();
        }

        for tenant in ["tenant-a", "tenant-b"] {
            let filter = FieldFilter::tenant(tenant);
            let full_facts = full_index.search(&filter);
            prop_assert_eq!(&full_facts, &incremental_index.search(&filter));
            prop_assert!(full_facts.iter().all(|f| f.tenant_id == tenant));
        }
    }
}
