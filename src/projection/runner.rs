// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projection Registry and Catch-Up Runner
//!
//! Projections are registered explicitly at startup; there is no dynamic
//! discovery. The runner pulls journal events matching each projection's
//! filters, feeds them to [`Projection::reduce`] in order, and tracks a
//! per-projection journal position.
//!
//! # Failure Semantics
//!
//! A reduce or journal-pull error in one projection never halts the
//! others. The failing projection keeps its position, so the same batch
//! is retried on the next pass (at-least-once delivery). Errors are
//! logged with the projection name.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::errors::CoreResult;
use crate::store::EventLog;

use super::Projection;

/// Runner tuning knobs
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Delay between catch-up passes when the journal is idle
    pub poll_interval: Duration,
    /// Maximum journal events scanned per pull
    pub batch_size: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            batch_size: 1000,
        }
    }
}

struct Registered {
    projection: Box<dyn Projection>,
    /// Journal position this projection has reduced up to
    position: u64,
}

/// Explicit startup registry of projections
#[derive(Default)]
pub struct ProjectionRegistry {
    entries: Vec<Registered>,
}

impl ProjectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a projection, starting from the journal beginning
    pub fn register(mut self, projection: impl Projection + 'static) -> Self {
        info!(projection = projection.name(), "registering projection");
        self.entries.push(Registered {
            projection: Box::new(projection),
            position: 0,
        });
        self
    }

    /// Names of the registered projections, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.projection.name()).collect()
    }
}

/// Catch-up runner feeding journal events to registered projections
pub struct ProjectionRunner {
    log: Arc<dyn EventLog>,
    registry: ProjectionRegistry,
    config: RunnerConfig,
}

impl ProjectionRunner {
    /// Create a runner over an event log
    pub fn new(log: Arc<dyn EventLog>, registry: ProjectionRegistry) -> Self {
        Self::with_config(log, registry, RunnerConfig::default())
    }

    /// Create a runner with custom tuning
    pub fn with_config(
        log: Arc<dyn EventLog>,
        registry: ProjectionRegistry,
        config: RunnerConfig,
    ) -> Self {
        Self {
            log,
            registry,
            config,
        }
    }

    /// Journal position of one projection, for tests and health checks
    pub fn position(&self, name: &str) -> Option<u64> {
        self.registry
            .entries
            .iter()
            .find(|e| e.projection.name() == name)
            .map(|e| e.position)
    }

    /// Drain the journal into every projection until all are caught up
    ///
    /// Returns the number of events reduced across all projections. A
    /// projection whose pull or reduce fails is skipped for the rest of
    /// the pass and keeps its position.
    pub async fn catch_up(&mut self) -> CoreResult<usize> {
        let mut total = 0;
        for entry in &mut self.registry.entries {
            let filters = entry.projection.filters();
            loop {
                let page = match self
                    .log
                    .pull(&filters, entry.position, self.config.batch_size)
                    .await
                {
                    Ok(page) => page,
                    Err(err) => {
                        error!(
                            projection = entry.projection.name(),
                            position = entry.position,
                            %err,
                            "journal pull failed, will retry"
                        );
                        break;
                    }
                };
                if page.next_position == entry.position {
                    break;
                }
                if !page.events.is_empty() {
                    debug!(
                        projection = entry.projection.name(),
                        events = page.events.len(),
                        position = page.next_position,
                        "reducing batch"
                    );
                    if let Err(err) = entry.projection.reduce(&page.events) {
                        error!(
                            projection = entry.projection.name(),
                            position = entry.position,
                            %err,
                            "projection reduce failed, will retry"
                        );
                        break;
                    }
                    total += page.events.len();
                }
                entry.position = page.next_position;
            }
        }
        Ok(total)
    }

    /// Run catch-up passes forever, sleeping when the journal is idle
    pub async fn run(mut self) -> CoreResult<()> {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        loop {
            interval.tick().await;
            self.catch_up().await?;
        }
    }
}
