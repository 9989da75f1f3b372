// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reduction Framework
//!
//! The generic contract every read model implements: declare which events
//! it needs, consume them in order, mutate derived state in place.
//!
//! # Contract
//!
//! ```text
//! Projection::filters() → which events (OR'd predicate groups)
//! Projection::reduce()  → ordered events → state mutation
//! ```
//!
//! Guarantees implementations must uphold:
//!
//! 1. **Replay-equivalence**: reducing the complete ordered history once
//!    must produce the same state as reducing incrementally as events
//!    arrive. Derived state is always reconstructible from the empty
//!    state.
//! 2. **Ordering**: events are applied in ascending sequence within one
//!    aggregate stream. No order is guaranteed across streams; a
//!    projection merging multiple aggregate types must not depend on
//!    cross-stream order except through the two-pass rule: events of the
//!    entity's identity-establishing aggregate are applied first within
//!    each reduce call, because later-aggregate events are interpreted
//!    using fields the identity aggregate establishes.
//! 3. **Failure semantics**: a payload the projection declared interest
//!    in but cannot interpret is fatal to that reduce call
//!    ([`CoreError::Replay`]); an unrecognized event type is a no-op,
//!    never an error.
//!
//! # Module Organization
//!
//! - [`runner`] - registry + catch-up runner over the event log
//! - [`org`], [`instance`], [`login_names`] - entity projections

pub mod instance;
pub mod login_names;
pub mod org;
pub mod runner;

use std::sync::{Arc, RwLock};

use crate::errors::CoreResult;
use crate::events::{AggregateType, Event};

pub use instance::{InstanceDomain, InstanceProjection, InstanceRow};
pub use login_names::{LoginName, LoginNameProjection};
pub use org::{OrgProjection, OrgRow};
pub use runner::{ProjectionRegistry, ProjectionRunner, RunnerConfig};

/// One predicate group of a projection's event filter
///
/// Unset members match everything; groups are OR'd across a projection's
/// filter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Restrict to one tenant
    pub tenant_id: Option<String>,
    /// Aggregate type this group selects (required)
    pub aggregate_type: Option<AggregateType>,
    /// Restrict to specific aggregates (empty = all)
    pub aggregate_ids: Vec<String>,
    /// Restrict to specific event types (empty = all)
    pub event_types: Vec<&'static str>,
    /// Restrict to one resource owner
    pub resource_owner: Option<String>,
}

impl EventFilter {
    /// Group selecting every event of one aggregate type
    pub fn aggregate(aggregate_type: AggregateType) -> Self {
        Self {
            aggregate_type: Some(aggregate_type),
            ..Self::default()
        }
    }

    /// Restrict to one tenant
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Restrict to specific aggregates
    pub fn with_aggregate_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aggregate_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to specific event types
    pub fn with_event_types(mut self, types: Vec<&'static str>) -> Self {
        self.event_types = types;
        self
    }

    /// Restrict to one resource owner
    pub fn with_resource_owner(mut self, resource_owner: impl Into<String>) -> Self {
        self.resource_owner = Some(resource_owner.into());
        self
    }

    /// Whether an event satisfies this predicate group
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(tenant) = &self.tenant_id {
            if &event.tenant_id != tenant {
                return false;
            }
        }
        if let Some(aggregate_type) = self.aggregate_type {
            if event.aggregate_type() != aggregate_type {
                return false;
            }
        }
        if !self.aggregate_ids.is_empty() && !self.aggregate_ids.contains(&event.aggregate_id) {
            return false;
        }
        if !self.event_types.is_empty() && !self.event_types.contains(&event.event_type()) {
            return false;
        }
        if let Some(owner) = &self.resource_owner {
            if &event.resource_owner != owner {
                return false;
            }
        }
        true
    }
}

/// Whether any group of a filter list matches an event
pub fn any_matches(filters: &[EventFilter], event: &Event) -> bool {
    filters.iter().any(|f| f.matches(event))
}

/// A read model deriving queryable state from the event log
///
/// Implementations mutate their own state only; reduce errors in one
/// projection never halt others (the runner isolates them).
pub trait Projection: Send {
    /// Stable name, used for position tracking and logging
    fn name(&self) -> &'static str;

    /// Predicate groups, OR'd; the runner feeds only matching events
    fn filters(&self) -> Vec<EventFilter>;

    /// Apply events in ascending sequence order
    fn reduce(&mut self, events: &[Event]) -> CoreResult<()>;
}

/// Shared handle splitting a projection between the runner and readers
///
/// The runner drives `reduce` through one clone while the query side
/// reads the derived state through another. Lock poisoning is treated as
/// recoverable since reducers only mutate their own state.
pub struct SharedProjection<P> {
    inner: Arc<RwLock<P>>,
}

impl<P> SharedProjection<P> {
    /// Wrap a projection for shared access
    pub fn new(projection: P) -> Self {
        Self {
            inner: Arc::new(RwLock::new(projection)),
        }
    }

    /// Read the current derived state
    pub fn read<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }
}

impl<P> Clone for SharedProjection<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Projection + Sync> Projection for SharedProjection<P> {
    fn name(&self) -> &'static str {
        self.read(|p| p.name())
    }

    fn filters(&self) -> Vec<EventFilter> {
        self.read(|p| p.filters())
    }

    fn reduce(&mut self, events: &[Event]) -> CoreResult<()> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.reduce(events)
    }
}
