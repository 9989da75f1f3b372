// Copyright (c) 2025 - Cowboy AI, Inc.
//! Organization Projection
//!
//! Reduces organization lifecycle events into a queryable read model.
//! `Removed` is a terminal tombstone: the row keeps its last state and
//! applies no further mutation, so a replay racing a late event cannot
//! resurrect a removed organization.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::OrgState;
use crate::errors::CoreResult;
use crate::events::{AggregateType, Event, EventPayload, OrgEvent};

use super::{EventFilter, Projection};

/// Read model row for one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgRow {
    /// Organization ID
    pub id: String,

    /// Current name
    pub name: String,

    /// Primary domain, once one is set
    pub primary_domain: Option<String>,

    /// Lifecycle state
    pub state: OrgState,

    /// Timestamp of the last applied event
    pub change_date: DateTime<Utc>,

    /// Sequence of the last applied event
    pub sequence: u64,
}

/// Projection over the organization aggregate
#[derive(Debug, Default)]
pub struct OrgProjection {
    rows: HashMap<(String, String), OrgRow>,
}

impl OrgProjection {
    /// Create an empty projection
    pub fn new() -> Self {
        Self::default()
    }

    /// Current row for an organization, if any
    pub fn get(&self, tenant_id: &str, org_id: &str) -> Option<&OrgRow> {
        self.rows
            .get(&(tenant_id.to_string(), org_id.to_string()))
    }

    /// All rows of one tenant, sorted by organization ID
    pub fn tenant_orgs(&self, tenant_id: &str) -> Vec<&OrgRow> {
        let mut rows: Vec<&OrgRow> = self
            .rows
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_id)
            .map(|(_, row)| row)
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    fn apply(&mut self, event: &Event, payload: &OrgEvent) {
        let key = (event.tenant_id.clone(), event.aggregate_id.clone());

        if let OrgEvent::Added { name } = payload {
            // Removal is terminal, even against a reused identifier.
            if self
                .rows
                .get(&key)
                .is_some_and(|row| row.state == OrgState::Removed)
            {
                return;
            }
            self.rows.insert(
                key,
                OrgRow {
                    id: event.aggregate_id.clone(),
                    name: name.clone(),
                    primary_domain: None,
                    state: OrgState::Active,
                    change_date: event.created_at,
                    sequence: event.sequence,
                },
            );
            return;
        }

        let Some(row) = self.rows.get_mut(&key) else {
            // Event for an organization never added; nothing to mutate.
            return;
        };

        // Tombstone: removed organizations accept no further mutation.
        if row.state == OrgState::Removed {
            return;
        }

        match payload {
            OrgEvent::Changed { name } => row.name = name.clone(),
            OrgEvent::Deactivated => row.state = OrgState::Inactive,
            OrgEvent::Reactivated => row.state = OrgState::Active,
            OrgEvent::Removed => row.state = OrgState::Removed,
            OrgEvent::DomainPrimarySet { domain } => {
                row.primary_domain = Some(domain.clone());
            }
            // Domain registration, policies, and memberships do not
            // change this read model.
            _ => return,
        }

        row.change_date = event.created_at;
        row.sequence = event.sequence;
    }
}

impl Projection for OrgProjection {
    fn name(&self) -> &'static str {
        "orgs"
    }

    fn filters(&self) -> Vec<EventFilter> {
        vec![EventFilter::aggregate(AggregateType::Org)]
    }

    fn reduce(&mut self, events: &[Event]) -> CoreResult<()> {
        for event in events {
            if let EventPayload::Org(payload) = &event.payload {
                self.apply(event, payload);
            }
            // Other aggregate types: not declared, no-op.
        }
        Ok(())
    }
}
