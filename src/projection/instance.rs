// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance Projection
//!
//! Reduces tenant lifecycle events into the instance read model. Domain
//! entries track generation and primary flags; setting a primary clears
//! the flag on every other domain first, so exactly one domain is primary
//! at any time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreResult;
use crate::events::{AggregateType, Event, EventPayload, InstanceEvent};

use super::{EventFilter, Projection};

/// One instance domain entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDomain {
    /// Domain value
    pub value: String,
    /// Whether the platform generated this domain
    pub is_generated: bool,
    /// Whether this is the instance's primary domain
    pub is_primary: bool,
}

/// Read model row for one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRow {
    /// Instance ID (the tenant ID)
    pub id: String,

    /// Instance name
    pub name: String,

    /// Default organization for new resources
    pub default_org_id: Option<String>,

    /// Default language
    pub default_language: Option<String>,

    /// Console application ID
    pub console_app_id: Option<String>,

    /// Registered domains
    pub domains: Vec<InstanceDomain>,

    /// Terminal removal tombstone
    pub removed: bool,

    /// Timestamp of the last applied event
    pub change_date: DateTime<Utc>,

    /// Sequence of the last applied event
    pub sequence: u64,
}

/// Projection over the instance aggregate
#[derive(Debug, Default)]
pub struct InstanceProjection {
    rows: HashMap<String, InstanceRow>,
}

impl InstanceProjection {
    /// Create an empty projection
    pub fn new() -> Self {
        Self::default()
    }

    /// Current row for a tenant, if any
    pub fn get(&self, tenant_id: &str) -> Option<&InstanceRow> {
        self.rows.get(tenant_id)
    }

    fn apply(&mut self, event: &Event, payload: &InstanceEvent) {
        if let InstanceEvent::Added { name } = payload {
            // Removal is terminal, even against a reused identifier.
            if self.rows.get(&event.tenant_id).is_some_and(|row| row.removed) {
                return;
            }
            self.rows.insert(
                event.tenant_id.clone(),
                InstanceRow {
                    id: event.tenant_id.clone(),
                    name: name.clone(),
                    default_org_id: None,
                    default_language: None,
                    console_app_id: None,
                    domains: Vec::new(),
                    removed: false,
                    change_date: event.created_at,
                    sequence: event.sequence,
                },
            );
            return;
        }

        let Some(row) = self.rows.get_mut(&event.tenant_id) else {
            return;
        };
        if row.removed {
            return;
        }

        match payload {
            InstanceEvent::Changed { name } => row.name = name.clone(),
            InstanceEvent::DefaultOrgSet { org_id } => {
                row.default_org_id = Some(org_id.clone());
            }
            InstanceEvent::DefaultLanguageSet { language } => {
                row.default_language = Some(language.clone());
            }
            InstanceEvent::ConsoleSet { app_id } => {
                row.console_app_id = Some(app_id.clone());
            }
            InstanceEvent::DomainAdded { domain, is_generated } => {
                if !row.domains.iter().any(|d| &d.value == domain) {
                    row.domains.push(InstanceDomain {
                        value: domain.clone(),
                        is_generated: *is_generated,
                        is_primary: false,
                    });
                }
            }
            InstanceEvent::DomainPrimarySet { domain } => {
                // Clear the flag everywhere before setting the target.
                for entry in &mut row.domains {
                    entry.is_primary = false;
                }
                if let Some(entry) = row.domains.iter_mut().find(|d| &d.value == domain) {
                    entry.is_primary = true;
                }
            }
            InstanceEvent::DomainRemoved { domain } => {
                row.domains.retain(|d| &d.value != domain);
            }
            InstanceEvent::Removed => row.removed = true,
            // Policies and memberships feed other read models.
            _ => return,
        }

        row.change_date = event.created_at;
        row.sequence = event.sequence;
    }
}

impl Projection for InstanceProjection {
    fn name(&self) -> &'static str {
        "instances"
    }

    fn filters(&self) -> Vec<EventFilter> {
        vec![EventFilter::aggregate(AggregateType::Instance)]
    }

    fn reduce(&mut self, events: &[Event]) -> CoreResult<()> {
        for event in events {
            if let EventPayload::Instance(payload) = &event.payload {
                self.apply(event, payload);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(tenant: &str, sequence: u64, payload: InstanceEvent) -> Event {
        Event {
            event_id: Uuid::now_v7(),
            tenant_id: tenant.to_string(),
            aggregate_id: tenant.to_string(),
            resource_owner: tenant.to_string(),
            sequence,
            created_at: Utc::now(),
            editor: "test".to_string(),
            payload: EventPayload::Instance(payload),
        }
    }

    #[test]
    fn test_primary_set_clears_other_domains() {
        let mut projection = InstanceProjection::new();
        projection
            .reduce(&[
                event("t1", 1, InstanceEvent::Added { name: "Tenant One".to_string() }),
                event("t1", 2, InstanceEvent::DomainAdded {
                    domain: "t1.platform.example".to_string(),
                    is_generated: true,
                }),
                event("t1", 3, InstanceEvent::DomainAdded {
                    domain: "login.acme.example".to_string(),
                    is_generated: false,
                }),
                event("t1", 4, InstanceEvent::DomainPrimarySet {
                    domain: "t1.platform.example".to_string(),
                }),
                event("t1", 5, InstanceEvent::DomainPrimarySet {
                    domain: "login.acme.example".to_string(),
                }),
            ])
            .unwrap();

        let row = projection.get("t1").unwrap();
        let primaries: Vec<&InstanceDomain> =
            row.domains.iter().filter(|d| d.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].value, "login.acme.example");
    }

    #[test]
    fn test_settings_accumulate() {
        let mut projection = InstanceProjection::new();
        projection
            .reduce(&[
                event("t1", 1, InstanceEvent::Added { name: "Tenant One".to_string() }),
                event("t1", 2, InstanceEvent::DefaultOrgSet { org_id: "org-1".to_string() }),
                event("t1", 3, InstanceEvent::DefaultLanguageSet { language: "en".to_string() }),
                event("t1", 4, InstanceEvent::ConsoleSet { app_id: "console-1".to_string() }),
            ])
            .unwrap();

        let row = projection.get("t1").unwrap();
        assert_eq!(row.default_org_id.as_deref(), Some("org-1"));
        assert_eq!(row.default_language.as_deref(), Some("en"));
        assert_eq!(row.console_app_id.as_deref(), Some("console-1"));
        assert_eq!(row.sequence, 4);
    }

    #[test]
    fn test_removed_is_terminal() {
        let mut projection = InstanceProjection::new();
        projection
            .reduce(&[
                event("t1", 1, InstanceEvent::Added { name: "Tenant One".to_string() }),
                event("t1", 2, InstanceEvent::Removed),
                event("t1", 3, InstanceEvent::Changed { name: "Ghost".to_string() }),
            ])
            .unwrap();

        let row = projection.get("t1").unwrap();
        assert!(row.removed);
        assert_eq!(row.name, "Tenant One");
    }
}
