// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Log Abstraction
//!
//! This module defines the append-only event log interface and its
//! implementations. Every state change in the system flows through the
//! log before any projection observes it.
//!
//! # Architecture
//!
//! ```text
//! Command → Events → EventLog → Tenant Journal
//!                        ↓
//!                  Projections (fields, orgs, instances, login names)
//! ```
//!
//! # Log Requirements
//!
//! 1. **Append-Only**: Events are never updated or deleted
//! 2. **Ordered**: Strictly increasing sequence per aggregate stream
//! 3. **Guarded**: Optimistic concurrency on the expected stream sequence
//! 4. **Unique**: Value claims are checked atomically with the append
//! 5. **Replay**: Events can be read back in order from any position

use async_trait::async_trait;

use crate::errors::CoreResult;
use crate::events::{AggregateType, Event, EventPayload};
use crate::projection::EventFilter;

pub mod memory;
pub mod nats;

pub use memory::MemoryEventLog;
pub use nats::NatsEventLog;

/// A uniqueness claim applied atomically with an append
///
/// Claims guard business-unique values (org names, verified domains,
/// usernames) at write time. A claim that is already held rejects the
/// whole append; a release frees the value for a later claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueOp {
    /// Reserve `(kind, value)` for this tenant
    Claim { kind: String, value: String },
    /// Free `(kind, value)` for this tenant
    Release { kind: String, value: String },
}

impl UniqueOp {
    /// Claim constructor
    pub fn claim(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Claim {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Release constructor
    pub fn release(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Release {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// One atomic append to a single aggregate stream
#[derive(Debug, Clone)]
pub struct AppendRequest {
    /// Instance the stream belongs to
    pub tenant_id: String,
    /// Aggregate identifier within the tenant
    pub aggregate_id: String,
    /// Organization (or instance) owning the aggregate
    pub resource_owner: String,
    /// Who caused the change
    pub editor: String,
    /// Expected current stream sequence, `0` for a new stream.
    /// `None` skips the concurrency check.
    pub expected_sequence: Option<u64>,
    /// Payloads to append, in order
    pub payloads: Vec<EventPayload>,
    /// Uniqueness claims and releases applied with the append
    pub unique_ops: Vec<UniqueOp>,
}

impl AppendRequest {
    /// Build a request with no concurrency guard and no unique ops
    pub fn new(
        tenant_id: impl Into<String>,
        aggregate_id: impl Into<String>,
        resource_owner: impl Into<String>,
        editor: impl Into<String>,
        payloads: Vec<EventPayload>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            aggregate_id: aggregate_id.into(),
            resource_owner: resource_owner.into(),
            editor: editor.into(),
            expected_sequence: None,
            payloads,
            unique_ops: Vec::new(),
        }
    }

    /// Guard the append against concurrent writers
    pub fn with_expected_sequence(mut self, sequence: u64) -> Self {
        self.expected_sequence = Some(sequence);
        self
    }

    /// Attach uniqueness claims and releases
    pub fn with_unique_ops(mut self, ops: Vec<UniqueOp>) -> Self {
        self.unique_ops = ops;
        self
    }
}

/// A page of journal events for catch-up consumers
#[derive(Debug, Clone)]
pub struct StreamPage {
    /// Matching events, in journal order
    pub events: Vec<Event>,
    /// Position to resume from on the next pull
    pub next_position: u64,
}

/// Append-only event log with per-stream optimistic concurrency
///
/// Implementations must ensure:
///
/// - **Atomicity**: An append (events plus unique ops) succeeds or
///   fails as a unit
/// - **Ordering**: Sequences within a stream increase strictly by one
/// - **Durability**: Events survive process restarts (where backed by
///   persistent storage)
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append events to one aggregate stream
    ///
    /// Returns the stored events with their assigned sequences.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Concurrency`](crate::errors::CoreError::Concurrency)
    ///   when `expected_sequence` does not match the stream
    /// - [`CoreError::UniqueConstraint`](crate::errors::CoreError::UniqueConstraint)
    ///   when a claim is already held
    async fn append(&self, request: AppendRequest) -> CoreResult<Vec<Event>>;

    /// Read one aggregate stream in sequence order
    async fn read_stream(
        &self,
        tenant_id: &str,
        aggregate_type: AggregateType,
        aggregate_id: &str,
    ) -> CoreResult<Vec<Event>>;

    /// Current sequence of a stream, `0` when the stream is empty
    async fn stream_sequence(
        &self,
        tenant_id: &str,
        aggregate_type: AggregateType,
        aggregate_id: &str,
    ) -> CoreResult<u64>;

    /// Pull journal events matching any of the filters
    ///
    /// `from_position` is exclusive; pass `0` to read from the start
    /// and the returned `next_position` to resume. At most `limit`
    /// matching events are returned.
    async fn pull(
        &self,
        filters: &[EventFilter],
        from_position: u64,
        limit: usize,
    ) -> CoreResult<StreamPage>;
}
