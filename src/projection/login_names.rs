// Copyright (c) 2025 - Cowboy AI, Inc.
//! Login-Name Resolver
//!
//! Cross-aggregate projection computing a user's displayable login names
//! from three inputs: the username (user aggregate), the effective domain
//! policy (instance default, overridable per organization), and the
//! organization's verified domains.
//!
//! The projection stores the three inputs and derives login names at
//! query time, so a change to any input is reflected on the next read
//! without recompute bookkeeping. Cross-entity relationships are looked
//! up by identifier, never held as references.
//!
//! # Two-pass rule
//!
//! Within one reduce call, user events are applied before org and
//! instance events: the user aggregate establishes the identity (which
//! organization owns the user) that the policy and domain events are
//! interpreted against. Across reduce calls no cross-stream order is
//! assumed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreResult;
use crate::events::{
    AggregateType, Event, EventPayload, InstanceEvent, OrgEvent, UserEvent,
};

use super::{EventFilter, Projection};

/// One displayable login name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginName {
    /// `username` or `username@domain`
    pub name: String,
    /// Exactly one login name per user is primary
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
struct UserRow {
    username: String,
    org_id: String,
}

#[derive(Debug, Clone)]
struct OrgDomain {
    domain: String,
    verified: bool,
    primary: bool,
}

/// Projection resolving login names per user
#[derive(Debug, Default)]
pub struct LoginNameProjection {
    users: HashMap<(String, String), UserRow>,
    org_domains: HashMap<(String, String), Vec<OrgDomain>>,
    org_policy: HashMap<(String, String), bool>,
    instance_policy: HashMap<String, bool>,
}

impl LoginNameProjection {
    /// Create an empty projection
    pub fn new() -> Self {
        Self::default()
    }

    /// Login names of a user, primary first
    ///
    /// Empty when the user is unknown or removed. When the effective
    /// policy requires domain suffixing but the organization has no
    /// verified domain yet, the bare username is returned as primary.
    pub fn login_names(&self, tenant_id: &str, user_id: &str) -> Vec<LoginName> {
        let Some(user) = self
            .users
            .get(&(tenant_id.to_string(), user_id.to_string()))
        else {
            return Vec::new();
        };

        let org_key = (tenant_id.to_string(), user.org_id.clone());
        let must_suffix = self
            .org_policy
            .get(&org_key)
            .copied()
            .unwrap_or_else(|| self.instance_policy.get(tenant_id).copied().unwrap_or(false));

        if !must_suffix {
            return vec![LoginName {
                name: user.username.clone(),
                is_primary: true,
            }];
        }

        let verified: Vec<&OrgDomain> = self
            .org_domains
            .get(&org_key)
            .map(|domains| domains.iter().filter(|d| d.verified).collect())
            .unwrap_or_default();

        if verified.is_empty() {
            return vec![LoginName {
                name: user.username.clone(),
                is_primary: true,
            }];
        }

        let has_primary = verified.iter().any(|d| d.primary);
        let mut names: Vec<LoginName> = verified
            .iter()
            .enumerate()
            .map(|(i, d)| LoginName {
                name: format!("{}@{}", user.username, d.domain),
                // Exactly one primary: fall back to the first verified
                // domain until one is explicitly marked.
                is_primary: if has_primary { d.primary } else { i == 0 },
            })
            .collect();
        names.sort_by(|a, b| b.is_primary.cmp(&a.is_primary).then(a.name.cmp(&b.name)));
        names
    }

    fn apply_user(&mut self, event: &Event, payload: &UserEvent) {
        let key = (event.tenant_id.clone(), event.aggregate_id.clone());
        match payload {
            UserEvent::Added { username } => {
                self.users.insert(
                    key,
                    UserRow {
                        username: username.clone(),
                        org_id: event.resource_owner.clone(),
                    },
                );
            }
            UserEvent::UsernameChanged { username } => {
                if let Some(user) = self.users.get_mut(&key) {
                    user.username = username.clone();
                }
            }
            UserEvent::Removed => {
                self.users.remove(&key);
            }
        }
    }

    fn apply_org(&mut self, event: &Event, payload: &OrgEvent) {
        let key = (event.tenant_id.clone(), event.aggregate_id.clone());
        match payload {
            OrgEvent::DomainAdded { domain } => {
                let domains = self.org_domains.entry(key).or_default();
                if !domains.iter().any(|d| &d.domain == domain) {
                    domains.push(OrgDomain {
                        domain: domain.clone(),
                        verified: false,
                        primary: false,
                    });
                }
            }
            OrgEvent::DomainVerified { domain } => {
                if let Some(entry) = self
                    .org_domains
                    .get_mut(&key)
                    .and_then(|d| d.iter_mut().find(|d| &d.domain == domain))
                {
                    entry.verified = true;
                }
            }
            OrgEvent::DomainRemoved { domain } => {
                if let Some(domains) = self.org_domains.get_mut(&key) {
                    domains.retain(|d| &d.domain != domain);
                }
            }
            OrgEvent::DomainPrimarySet { domain } => {
                if let Some(domains) = self.org_domains.get_mut(&key) {
                    for entry in domains.iter_mut() {
                        entry.primary = &entry.domain == domain;
                    }
                }
            }
            OrgEvent::DomainPolicyAdded { user_login_must_be_domain }
            | OrgEvent::DomainPolicyChanged { user_login_must_be_domain } => {
                self.org_policy.insert(key, *user_login_must_be_domain);
            }
            OrgEvent::DomainPolicyRemoved => {
                self.org_policy.remove(&key);
            }
            OrgEvent::Removed => {
                // Cross-aggregate removal: drop the org's users too.
                let (tenant, org) = key;
                self.users
                    .retain(|(t, _), u| !(t == &tenant && u.org_id == org));
                self.org_domains.remove(&(tenant.clone(), org.clone()));
                self.org_policy.remove(&(tenant, org));
            }
            _ => {}
        }
    }

    fn apply_instance(&mut self, event: &Event, payload: &InstanceEvent) {
        match payload {
            InstanceEvent::DomainPolicySet { user_login_must_be_domain } => {
                self.instance_policy
                    .insert(event.tenant_id.clone(), *user_login_must_be_domain);
            }
            InstanceEvent::Removed => {
                let tenant = event.tenant_id.clone();
                self.users.retain(|(t, _), _| t != &tenant);
                self.org_domains.retain(|(t, _), _| t != &tenant);
                self.org_policy.retain(|(t, _), _| t != &tenant);
                self.instance_policy.remove(&tenant);
            }
            _ => {}
        }
    }
}

impl Projection for LoginNameProjection {
    fn name(&self) -> &'static str {
        "login_names"
    }

    fn filters(&self) -> Vec<EventFilter> {
        vec![
            EventFilter::aggregate(AggregateType::User),
            EventFilter::aggregate(AggregateType::Org).with_event_types(vec![
                "org.domain.added",
                "org.domain.verified",
                "org.domain.removed",
                "org.domain.primary.set",
                "org.policy.domain.added",
                "org.policy.domain.changed",
                "org.policy.domain.removed",
                "org.removed",
            ]),
            EventFilter::aggregate(AggregateType::Instance).with_event_types(vec![
                "instance.policy.domain.set",
                "instance.removed",
            ]),
        ]
    }

    fn reduce(&mut self, events: &[Event]) -> CoreResult<()> {
        // Pass 1: identity-establishing user events.
        for event in events {
            if let EventPayload::User(payload) = &event.payload {
                self.apply_user(event, payload);
            }
        }
        // Pass 2: policy and domain inputs.
        for event in events {
            match &event.payload {
                EventPayload::Org(payload) => self.apply_org(event, payload),
                EventPayload::Instance(payload) => self.apply_instance(event, payload),
                _ => {}
            }
        }
        Ok(())
    }
}
