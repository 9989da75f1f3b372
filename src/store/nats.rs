// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS JetStream Event Log Implementation
//!
//! This module implements the [`EventLog`] trait on NATS JetStream,
//! providing durable tenant journals with replay. Uniqueness claims are
//! backed by a key-value bucket whose create-if-absent semantics give
//! the atomic check the log contract requires.
//!
//! # Subject Layout
//!
//! ```text
//! iam.<tenant_id>.<aggregate_type>.<aggregate_id>.<event_type>
//! ```
//!
//! One JetStream stream captures `iam.>`; per-stream reads and journal
//! pulls are filtered consumers over that stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use iam_core::store::NatsEventLog;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let log = NatsEventLog::connect("nats://localhost:4222").await?;
//!     // Use log...
//!     Ok(())
//! }
//! ```

use std::fmt::Write as _;
use std::time::Duration;

use async_nats::jetstream::{self, consumer::DeliverPolicy, kv, stream::Stream};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::errors::{CoreError, CoreResult};
use crate::events::{AggregateType, Event};
use crate::projection::{any_matches, EventFilter};

use super::{AppendRequest, EventLog, StreamPage, UniqueOp};

/// Configuration for the JetStream-backed log
#[derive(Debug, Clone)]
pub struct NatsLogConfig {
    /// Stream name for authorization events
    pub stream_name: String,

    /// Subjects the stream captures (defaults to "iam.>")
    pub subjects: Vec<String>,

    /// Key-value bucket holding uniqueness claims
    pub unique_bucket: String,

    /// Maximum bytes stored in the stream (default: 10GB)
    pub max_bytes: i64,

    /// Storage type (File or Memory)
    pub storage: StorageType,

    /// Number of replicas (for clustered NATS)
    pub replicas: usize,
}

impl Default for NatsLogConfig {
    fn default() -> Self {
        Self {
            stream_name: "IAM_EVENTS".to_string(),
            subjects: vec!["iam.>".to_string()],
            unique_bucket: "iam_unique".to_string(),
            max_bytes: 10 * 1024 * 1024 * 1024, // 10 GB
            storage: StorageType::File,
            replicas: 1,
        }
    }
}

/// Storage type for JetStream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// File-based storage (persistent across restarts)
    File,
    /// Memory-based storage (faster, but lost on restart)
    Memory,
}

/// NATS JetStream-backed event log
pub struct NatsEventLog {
    jetstream: jetstream::Context,
    stream: Stream,
    unique: kv::Store,
    subject_prefix: String,
}

impl NatsEventLog {
    /// Connect to NATS with the default configuration
    pub async fn connect(nats_url: &str) -> CoreResult<Self> {
        Self::connect_with_config(nats_url, NatsLogConfig::default()).await
    }

    /// Connect with custom configuration
    ///
    /// Creates the event stream and the uniqueness bucket when they do
    /// not exist yet, so first startup and restart are the same path.
    pub async fn connect_with_config(nats_url: &str, config: NatsLogConfig) -> CoreResult<Self> {
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| CoreError::Connection(e.to_string()))?;
        info!("Connected to NATS at {}", nats_url);
        let jetstream = jetstream::new(client);

        let storage = match config.storage {
            StorageType::File => jetstream::stream::StorageType::File,
            StorageType::Memory => jetstream::stream::StorageType::Memory,
        };

        let stream = jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream_name.clone(),
                subjects: config.subjects.clone(),
                max_bytes: config.max_bytes,
                storage,
                num_replicas: config.replicas,
                retention: jetstream::stream::RetentionPolicy::Limits,
                ..Default::default()
            })
            .await
            .map_err(|e| CoreError::Connection(e.to_string()))?;

        let unique = match jetstream.get_key_value(&config.unique_bucket).await {
            Ok(store) => store,
            Err(_) => jetstream
                .create_key_value(kv::Config {
                    bucket: config.unique_bucket.clone(),
                    ..Default::default()
                })
                .await
                .map_err(|e| CoreError::Connection(e.to_string()))?,
        };
        info!(
            "Event stream '{}' and uniqueness bucket '{}' ready",
            config.stream_name, config.unique_bucket
        );

        Ok(Self {
            jetstream,
            stream,
            unique,
            subject_prefix: "iam".to_string(),
        })
    }

    /// Subject for one event
    ///
    /// Format: iam.<tenant>.<aggregate_type>.<aggregate_id>.<event_type>
    fn build_subject(&self, event: &Event) -> String {
        format!(
            "{}.{}.{}.{}.{}",
            self.subject_prefix,
            event.tenant_id,
            event.aggregate_type(),
            event.aggregate_id,
            event.event_type()
        )
    }

    /// Consumer filter for one aggregate stream
    fn stream_subject_filter(
        &self,
        tenant_id: &str,
        aggregate_type: AggregateType,
        aggregate_id: &str,
    ) -> String {
        format!(
            "{}.{}.{}.{}.>",
            self.subject_prefix, tenant_id, aggregate_type, aggregate_id
        )
    }

    /// Claim key within the uniqueness bucket
    ///
    /// KV keys restrict the character set, so the claimed value is hex
    /// encoded.
    fn claim_key(tenant_id: &str, kind: &str, value: &str) -> String {
        let mut encoded = String::with_capacity(value.len() * 2);
        for byte in value.as_bytes() {
            let _ = write!(encoded, "{byte:02x}");
        }
        format!("{tenant_id}.{kind}.{encoded}")
    }

    /// Write the request's claims, returning the created keys
    ///
    /// When a claim collides, the keys created so far are rolled back and
    /// the whole append fails with [`CoreError::UniqueConstraint`].
    async fn claim_unique_values(
        &self,
        tenant_id: &str,
        ops: &[UniqueOp],
    ) -> CoreResult<Vec<String>> {
        let mut created: Vec<String> = Vec::new();
        for op in ops {
            if let UniqueOp::Claim { kind, value } = op {
                let key = Self::claim_key(tenant_id, kind, value);
                match self.unique.create(&key, value.clone().into()).await {
                    Ok(_) => created.push(key),
                    Err(err) => {
                        self.rollback_claims(&created).await;
                        return Err(CoreError::UniqueConstraint(format!(
                            "{kind} '{value}' already claimed in tenant {tenant_id}: {err}"
                        )));
                    }
                }
            }
        }
        Ok(created)
    }

    /// Best-effort purge of claims written by an append that did not land
    async fn rollback_claims(&self, keys: &[String]) {
        for key in keys {
            if let Err(err) = self.unique.purge(key).await {
                warn!("Failed to roll back uniqueness claim '{}': {}", key, err);
            }
        }
    }

    /// Purge released values
    ///
    /// Runs only after the append's events are recorded, so a failed
    /// append never frees a value whose release event was never stored.
    async fn release_unique_values(&self, tenant_id: &str, ops: &[UniqueOp]) -> CoreResult<()> {
        for op in ops {
            if let UniqueOp::Release { kind, value } = op {
                let key = Self::claim_key(tenant_id, kind, value);
                self.unique
                    .purge(&key)
                    .await
                    .map_err(|e| CoreError::Connection(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Serialize and publish one event to its stream subject
    async fn publish_event(&self, event: &Event) -> CoreResult<()> {
        let subject = self.build_subject(event);
        let payload_bytes =
            serde_json::to_vec(event).map_err(|e| CoreError::Serialization(e.to_string()))?;

        self.jetstream
            .publish(subject.clone(), payload_bytes.into())
            .await
            .map_err(|e| CoreError::Connection(e.to_string()))?
            .await
            .map_err(|e| CoreError::Connection(e.to_string()))?;

        debug!("Published event to subject: {}", subject);
        Ok(())
    }

    /// Fetch all messages of a filtered consumer, in stream order
    async fn fetch_all(
        &self,
        filter_subject: String,
        deliver_policy: DeliverPolicy,
        max_events: Option<usize>,
    ) -> CoreResult<Vec<(u64, Event)>> {
        let consumer = self
            .stream
            .create_consumer(jetstream::consumer::pull::Config {
                filter_subject,
                deliver_policy,
                ..Default::default()
            })
            .await
            .map_err(|e| CoreError::Connection(e.to_string()))?;

        const BATCH_SIZE: usize = 10_000;
        let mut events = Vec::new();

        loop {
            let batch_limit = match max_events {
                Some(max) => {
                    if events.len() >= max {
                        break;
                    }
                    BATCH_SIZE.min(max - events.len())
                }
                None => BATCH_SIZE,
            };

            // A fetch that times out means the stream is drained, not a
            // failure.
            let messages_result = consumer
                .fetch()
                .max_messages(batch_limit)
                .expires(Duration::from_secs(2))
                .messages()
                .await;

            let mut messages = match messages_result {
                Ok(msgs) => msgs,
                Err(e) => {
                    let err_msg = e.to_string().to_lowercase();
                    if err_msg.contains("timeout") || err_msg.contains("timed out") {
                        break;
                    }
                    return Err(CoreError::Connection(e.to_string()));
                }
            };

            let mut batch_count = 0;
            while let Some(message) = messages.next().await {
                let msg = message.map_err(|e| CoreError::Connection(e.to_string()))?;
                let position = msg
                    .info()
                    .map_err(|e| CoreError::Connection(e.to_string()))?
                    .stream_sequence;

                let event: Event = serde_json::from_slice(&msg.payload)
                    .map_err(|e| CoreError::Deserialization(e.to_string()))?;
                events.push((position, event));

                msg.ack()
                    .await
                    .map_err(|e| CoreError::Connection(e.to_string()))?;
                batch_count += 1;
            }

            if batch_count < batch_limit {
                break;
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl EventLog for NatsEventLog {
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

        let current = self
            .stream_sequence(&request.tenant_id, aggregate_type, &request.aggregate_id)
            .await?;
        if let Some(expected) = request.expected_sequence {
            if expected != current {
                return Err(CoreError::Concurrency(format!(
                    "stream {}/{}/{} is at sequence {}, expected {}",
                    request.tenant_id, aggregate_type, request.aggregate_id, current, expected
                )));
            }
        }

        let claimed = self
            .claim_unique_values(&request.tenant_id, &request.unique_ops)
            .await?;

        let mut stored = Vec::with_capacity(request.payloads.len());
        let mut sequence = current;
        for payload in request.payloads {
            sequence += 1;
            let event = Event {
                event_id: uuid::Uuid::now_v7(),
                tenant_id: request.tenant_id.clone(),
                aggregate_id: request.aggregate_id.clone(),
                resource_owner: request.resource_owner.clone(),
                sequence,
                created_at: chrono::Utc::now(),
                editor: request.editor.clone(),
                payload,
            };

            if let Err(err) = self.publish_event(&event).await {
                // A claim without an owning event would block the value
                // forever.
                self.rollback_claims(&claimed).await;
                return Err(err);
            }

            stored.push(event);
        }

        self.release_unique_values(&request.tenant_id, &request.unique_ops)
            .await?;

        Ok(stored)
    }

    async fn read_stream(
        &self,
        tenant_id: &str,
        aggregate_type: AggregateType,
        aggregate_id: &str,
    ) -> CoreResult<Vec<Event>> {
        let filter = self.stream_subject_filter(tenant_id, aggregate_type, aggregate_id);
        let mut events: Vec<Event> = self
            .fetch_all(filter, DeliverPolicy::All, None)
            .await?
            .into_iter()
            .map(|(_, event)| event)
            .collect();
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    async fn stream_sequence(
        &self,
        tenant_id: &str,
        aggregate_type: AggregateType,
        aggregate_id: &str,
    ) -> CoreResult<u64> {
        let events = self
            .read_stream(tenant_id, aggregate_type, aggregate_id)
            .await?;
        Ok(events.last().map(|e| e.sequence).unwrap_or(0))
    }

    async fn pull(
        &self,
        filters: &[EventFilter],
        from_position: u64,
        limit: usize,
    ) -> CoreResult<StreamPage> {
        let deliver_policy = if from_position == 0 {
            DeliverPolicy::All
        } else {
            DeliverPolicy::ByStartSequence {
                start_sequence: from_position + 1,
            }
        };

        let scanned = self
            .fetch_all(format!("{}.>", self.subject_prefix), deliver_policy, None)
            .await?;

        let mut events = Vec::new();
        let mut next_position = from_position;
        for (position, event) in scanned {
            if events.len() >= limit {
                break;
            }
            next_position = position;
            if any_matches(filters, &event) {
                events.push(event);
            }
        }

        Ok(StreamPage {
            events,
            next_position,
        })
    }
}
