// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Event Log
//!
//! A process-local [`EventLog`] backed by a single journal vector.
//! Used by tests and by embedded deployments that rebuild state on
//! startup. Appends take one write lock, so the atomicity of the
//! events-plus-unique-ops unit is trivially satisfied.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::events::{AggregateType, Event};
use crate::projection::{any_matches, EventFilter};

use super::{AppendRequest, EventLog, StreamPage, UniqueOp};

type StreamKey = (String, AggregateType, String);

#[derive(Debug, Default)]
struct LogInner {
    /// Journal position of an event is its index plus one
    journal: Vec<Event>,
    sequences: HashMap<StreamKey, u64>,
    /// Held claims, keyed (tenant, kind, value)
    unique: HashSet<(String, String, String)>,
}

/// In-memory append-only event log
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    inner: RwLock<LogInner>,
}

impl MemoryEventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events in the journal
    pub async fn len(&self) -> usize {
        self.inner.read().await.journal.len()
    }

    /// Whether the journal is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.journal.is_empty()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, request: AppendRequest) -> CoreResult<Vec<Event>> {
        if request.payloads.is_empty() {
            return Ok(Vec::new());
        }
        let aggregate_type = request.payloads[0].aggregate_type();
        if let Some(mixed) = request
            .payloads
            .iter()
            .find(|p| p.aggregate_type() != aggregate_type)
        {
            return Err(CoreError::Configuration(format!(
                "append mixes aggregate types {} and {}",
                aggregate_type,
                mixed.aggregate_type()
            )));
        }

        let mut inner = self.inner.write().await;

        let key = (
            request.tenant_id.clone(),
            aggregate_type,
            request.aggregate_id.clone(),
        );
        let current = inner.sequences.get(&key).copied().unwrap_or(0);
        if let Some(expected) = request.expected_sequence {
            if expected != current {
                return Err(CoreError::Concurrency(format!(
                    "stream {}/{}/{} is at sequence {}, expected {}",
                    request.tenant_id, aggregate_type, request.aggregate_id, current, expected
                )));
            }
        }

        // Validate every claim before touching any state, so a failed
        // append leaves no partial claims behind.
        for op in &request.unique_ops {
            if let UniqueOp::Claim { kind, value } = op {
                let claim = (request.tenant_id.clone(), kind.clone(), value.clone());
                if inner.unique.contains(&claim) {
                    return Err(CoreError::UniqueConstraint(format!(
                        "{} '{}' already claimed in tenant {}",
                        kind, value, request.tenant_id
                    )));
                }
            }
        }
        for op in &request.unique_ops {
            match op {
                UniqueOp::Claim { kind, value } => {
                    inner.unique.insert((
                        request.tenant_id.clone(),
                        kind.clone(),
                        value.clone(),
                    ));
                }
                UniqueOp::Release { kind, value } => {
                    inner.unique.remove(&(
                        request.tenant_id.clone(),
                        kind.clone(),
                        value.clone(),
                    ));
                }
            }
        }

        let mut stored = Vec::with_capacity(request.payloads.len());
        let mut sequence = current;
        for payload in request.payloads {
            sequence += 1;
            let event = Event {
                event_id: Uuid::now_v7(),
                tenant_id: request.tenant_id.clone(),
                aggregate_id: request.aggregate_id.clone(),
                resource_owner: request.resource_owner.clone(),
                sequence,
                created_at: Utc::now(),
                editor: request.editor.clone(),
                payload,
            };
            inner.journal.push(event.clone());
            stored.push(event);
        }
        inner.sequences.insert(key, sequence);

        Ok(stored)
    }

    async fn read_stream(
        &self,
        tenant_id: &str,
        aggregate_type: AggregateType,
        aggregate_id: &str,
    ) -> CoreResult<Vec<Event>> {
        let inner = self.inner.read().await;
        Ok(inner
            .journal
            .iter()
            .filter(|e| {
                e.tenant_id == tenant_id
                    && e.aggregate_type() == aggregate_type
                    && e.aggregate_id == aggregate_id
            })
            .cloned()
            .collect())
    }

    async fn stream_sequence(
        &self,
        tenant_id: &str,
        aggregate_type: AggregateType,
        aggregate_id: &str,
    ) -> CoreResult<u64> {
        let inner = self.inner.read().await;
        let key = (
            tenant_id.to_string(),
            aggregate_type,
            aggregate_id.to_string(),
        );
        Ok(inner.sequences.get(&key).copied().unwrap_or(0))
    }

    async fn pull(
        &self,
        filters: &[EventFilter],
        from_position: u64,
        limit: usize,
    ) -> CoreResult<StreamPage> {
        let inner = self.inner.read().await;
        let mut events = Vec::new();
        let mut next_position = from_position;
        for (index, event) in inner.journal.iter().enumerate() {
            let position = index as u64 + 1;
            if position <= from_position {
                continue;
            }
            if events.len() >= limit {
                break;
            }
            next_position = position;
            if any_matches(filters, event) {
                events.push(event.clone());
            }
        }
        Ok(StreamPage {
            events,
            next_position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventPayload, OrgEvent, UserEvent};
    use pretty_assertions::assert_eq;

    fn org_added(name: &str) -> EventPayload {
        EventPayload::Org(OrgEvent::Added {
            name: name.to_string(),
        })
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_sequences() {
        let log = MemoryEventLog::new();

        let first = log
            .append(AppendRequest::new(
                "t1",
                "org-1",
                "org-1",
                "admin",
                vec![
                    org_added("ACME"),
                    EventPayload::Org(OrgEvent::DomainAdded {
                        domain: "acme.example".to_string(),
                    }),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].sequence, 1);
        assert_eq!(first[1].sequence, 2);

        let second = log
            .append(AppendRequest::new(
                "t1",
                "org-1",
                "org-1",
                "admin",
                vec![EventPayload::Org(OrgEvent::Deactivated)],
            ))
            .await
            .unwrap();
        assert_eq!(second[0].sequence, 3);
        assert_eq!(
            log.stream_sequence("t1", AggregateType::Org, "org-1")
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_expected_sequence_mismatch_is_rejected() {
        let log = MemoryEventLog::new();
        log.append(AppendRequest::new(
            "t1",
            "org-1",
            "org-1",
            "admin",
            vec![org_added("ACME")],
        ))
        .await
        .unwrap();

        let result = log
            .append(
                AppendRequest::new(
                    "t1",
                    "org-1",
                    "org-1",
                    "admin",
                    vec![EventPayload::Org(OrgEvent::Deactivated)],
                )
                .with_expected_sequence(0),
            )
            .await;

        assert!(matches!(result, Err(CoreError::Concurrency(_))));
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_unique_claim_blocks_second_writer() {
        let log = MemoryEventLog::new();
        log.append(
            AppendRequest::new("t1", "org-1", "org-1", "admin", vec![org_added("ACME")])
                .with_unique_ops(vec![UniqueOp::claim("org_name", "ACME")]),
        )
        .await
        .unwrap();

        let result = log
            .append(
                AppendRequest::new("t1", "org-2", "org-2", "admin", vec![org_added("ACME")])
                    .with_unique_ops(vec![UniqueOp::claim("org_name", "ACME")]),
            )
            .await;

        assert!(matches!(result, Err(CoreError::UniqueConstraint(_))));
        // The rejected append leaves no events behind.
        assert_eq!(log.len().await, 1);

        // A different tenant may hold the same value.
        log.append(
            AppendRequest::new("t2", "org-9", "org-9", "admin", vec![org_added("ACME")])
                .with_unique_ops(vec![UniqueOp::claim("org_name", "ACME")]),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_release_frees_claim_for_reuse() {
        let log = MemoryEventLog::new();
        log.append(
            AppendRequest::new("t1", "org-1", "org-1", "admin", vec![org_added("ACME")])
                .with_unique_ops(vec![UniqueOp::claim("org_name", "ACME")]),
        )
        .await
        .unwrap();

        log.append(
            AppendRequest::new(
                "t1",
                "org-1",
                "org-1",
                "admin",
                vec![EventPayload::Org(OrgEvent::Changed {
                    name: "ACME Corp".to_string(),
                })],
            )
            .with_unique_ops(vec![
                UniqueOp::release("org_name", "ACME"),
                UniqueOp::claim("org_name", "ACME Corp"),
            ]),
        )
        .await
        .unwrap();

        // The old name is claimable again.
        log.append(
            AppendRequest::new("t1", "org-2", "org-2", "admin", vec![org_added("ACME")])
                .with_unique_ops(vec![UniqueOp::claim("org_name", "ACME")]),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_pull_filters_and_paginates() {
        let log = MemoryEventLog::new();
        log.append(AppendRequest::new(
            "t1",
            "org-1",
            "org-1",
            "admin",
            vec![org_added("ACME")],
        ))
        .await
        .unwrap();
        log.append(AppendRequest::new(
            "t1",
            "user-1",
            "org-1",
            "admin",
            vec![EventPayload::User(UserEvent::Added {
                username: "alice".to_string(),
            })],
        ))
        .await
        .unwrap();
        log.append(AppendRequest::new(
            "t1",
            "org-1",
            "org-1",
            "admin",
            vec![EventPayload::Org(OrgEvent::Deactivated)],
        ))
        .await
        .unwrap();

        let filters = vec![EventFilter::aggregate(AggregateType::Org)];
        let page = log.pull(&filters, 0, 10).await.unwrap();
        assert_eq!(page.events.len(), 2);
        assert_eq!(page.next_position, 3);

        // Resuming past the end yields nothing new.
        let page = log.pull(&filters, page.next_position, 10).await.unwrap();
        assert!(page.events.is_empty());
        assert_eq!(page.next_position, 3);

        // A limit of one returns the first match and a resumable position.
        let page = log.pull(&filters, 0, 1).await.unwrap();
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].event_type(), "org.added");
        assert_eq!(page.next_position, 1);
    }
}
