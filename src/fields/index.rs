// Copyright (c) 2025 - Cowboy AI, Inc.
//! Queryable Field Index
//!
//! In-memory implementation of the fact index. The index is the one
//! mutable shared resource of the core: all mutation happens inside a
//! single write-lock section so the uniqueness check and the insert are
//! atomic with respect to concurrent writers.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::errors::{CoreError, CoreResult};
use crate::events::AggregateType;

use super::{Field, FieldFilter, FieldOp};

/// Identity of a fact within the index
///
/// The value participates in the key: one object may hold several values
/// under the same field name (e.g. a user with two roles on one org).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FieldKey {
    tenant_id: String,
    aggregate_type: AggregateType,
    aggregate_id: String,
    object_type: String,
    object_id: String,
    field_name: String,
    value: String,
}

impl FieldKey {
    fn of(field: &Field) -> Self {
        Self {
            tenant_id: field.tenant_id.clone(),
            aggregate_type: field.aggregate_type,
            aggregate_id: field.aggregate_id.clone(),
            object_type: field.object_type.clone(),
            object_id: field.object_id.clone(),
            field_name: field.field_name.clone(),
            value: canonical(&field.value),
        }
    }
}

/// Uniqueness claims are tenant-wide per `(field_name, value)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct UniqueKey {
    tenant_id: String,
    field_name: String,
    value: String,
}

fn canonical(value: &Value) -> String {
    value.to_string()
}

#[derive(Debug, Default)]
struct IndexInner {
    fields: HashMap<FieldKey, Field>,
    unique: HashMap<UniqueKey, FieldKey>,
}

/// Externally queryable fact index
///
/// Workers may race to apply the same event; upserts are idempotent, so
/// the effect is exactly-once. Reads see all facts indexed up to the
/// caller's read point.
#[derive(Debug, Default)]
pub struct FieldIndex {
    inner: RwLock<IndexInner>,
}

impl FieldIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of field operations atomically
    ///
    /// The whole batch is validated against the uniqueness claims before
    /// any mutation, so a duplicate unique value fails the batch without
    /// partial effects.
    pub fn apply(&self, ops: &[FieldOp]) -> CoreResult<()> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Validation pass: every unique set in the batch must be free or
        // owned by the same fact already.
        for op in ops {
            if let FieldOp::Set(field) = op {
                if !field.value_must_be_unique {
                    continue;
                }
                let key = FieldKey::of(field);
                let unique_key = UniqueKey {
                    tenant_id: field.tenant_id.clone(),
                    field_name: field.field_name.clone(),
                    value: canonical(&field.value),
                };
                if let Some(owner) = inner.unique.get(&unique_key) {
                    if *owner != key {
                        return Err(CoreError::UniqueConstraint(format!(
                            "{}={} already claimed in tenant {}",
                            field.field_name, field.value, field.tenant_id
                        )));
                    }
                }
            }
        }

        for op in ops {
            match op {
                FieldOp::Set(field) => {
                    let key = FieldKey::of(field);

                    // Re-applied event: the revision token makes this a no-op.
                    if let Some(existing) = inner.fields.get(&key) {
                        if existing.revision >= field.revision {
                            continue;
                        }
                    }

                    if field.value_must_be_unique {
                        let unique_key = UniqueKey {
                            tenant_id: field.tenant_id.clone(),
                            field_name: field.field_name.clone(),
                            value: canonical(&field.value),
                        };
                        inner.unique.insert(unique_key, key.clone());
                    }
                    inner.fields.insert(key, field.clone());
                }
                FieldOp::Remove(filter) => {
                    let removed: Vec<FieldKey> = inner
                        .fields
                        .iter()
                        .filter(|(_, f)| filter.matches(f))
                        .map(|(k, _)| k.clone())
                        .collect();
                    for key in removed {
                        if let Some(field) = inner.fields.remove(&key) {
                            if field.value_must_be_unique {
                                let unique_key = UniqueKey {
                                    tenant_id: field.tenant_id.clone(),
                                    field_name: field.field_name.clone(),
                                    value: canonical(&field.value),
                                };
                                // Only release the claim if this fact still owns it.
                                if inner.unique.get(&unique_key) == Some(&key) {
                                    inner.unique.remove(&unique_key);
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Whether a `(field_name, value)` pair is currently claimed in a tenant
    pub fn is_claimed(&self, tenant_id: &str, field_name: &str, value: &Value) -> bool {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.unique.contains_key(&UniqueKey {
            tenant_id: tenant_id.to_string(),
            field_name: field_name.to_string(),
            value: canonical(value),
        })
    }

    /// All facts matching a filter
    pub fn search(&self, filter: &FieldFilter) -> Vec<Field> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut fields: Vec<Field> = inner
            .fields
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        fields.sort_by(|a, b| {
            (&a.aggregate_id, &a.object_id, &a.field_name, canonical(&a.value)).cmp(&(
                &b.aggregate_id,
                &b.object_id,
                &b.field_name,
                canonical(&b.value),
            ))
        });
        fields
    }

    /// Exact-match lookup returning the object IDs holding a value
    ///
    /// `aggregate_type`/`aggregate_id` narrow the scope when set. Results
    /// are deduplicated and sorted.
    pub fn lookup(
        &self,
        tenant_id: &str,
        aggregate_type: Option<AggregateType>,
        aggregate_id: Option<&str>,
        field_name: &str,
        value: &Value,
    ) -> Vec<String> {
        let mut filter = FieldFilter::tenant(tenant_id)
            .with_field_name(field_name)
            .with_value(value.clone());
        filter.aggregate_type = aggregate_type;
        filter.aggregate_id = aggregate_id.map(str::to_string);

        let mut ids: Vec<String> = self
            .search(&filter)
            .into_iter()
            .map(|f| f.object_id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Number of facts currently indexed (test support)
    pub fn len(&self) -> usize {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.fields.len()
    }

    /// Whether the index holds no facts
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
