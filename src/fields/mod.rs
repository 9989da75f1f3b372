// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fact Index
//!
//! A generalized secondary index materializing `(scope, object, field,
//! value)` facts from events. Facts are the substrate for both uniqueness
//! enforcement and role/permission lookups: the permission resolution
//! engine reads nothing else.
//!
//! # Architecture
//!
//! ```text
//! Event ──field_ops()──> [FieldOp] ──apply()──> FieldIndex
//!         (pure map)                 (atomic)       │
//!                                                   ▼
//!                                          lookup() / search()
//! ```
//!
//! # Module Organization
//!
//! - [`index`] - the queryable [`FieldIndex`] with its uniqueness guard
//! - [`handlers`] - the pure event → field-op mapping and the projection
//!   that feeds the index

pub mod handlers;
pub mod index;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::AggregateType;

// Object types and field names used by the authorization facts. The
// permission resolver and the field handlers must agree on these.
pub(crate) const OBJECT_ROLE_PERMISSION: &str = "role_permission";
pub(crate) const OBJECT_INSTANCE_MEMBER: &str = "instance_member_role";
pub(crate) const OBJECT_ORG_MEMBER: &str = "org_member_role";
pub(crate) const OBJECT_PROJECT_MEMBER: &str = "project_member_role";
pub(crate) const OBJECT_PROJECT_GRANT_MEMBER: &str = "project_grant_member_role";
pub(crate) const FIELD_PERMISSION: &str = "permission";
pub(crate) const FIELD_INSTANCE_ROLE: &str = "instance_role";
pub(crate) const FIELD_ORG_ROLE: &str = "org_role";
pub(crate) const FIELD_PROJECT_ROLE: &str = "project_role";

/// One indexed fact
///
/// Mirrors the persisted row layout: every field carries its tenant, the
/// owning aggregate (the scope), the object within that scope, and a
/// named value. `revision` is the sequence of the event that produced the
/// field; re-applying the same event is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Tenant this fact belongs to
    pub tenant_id: String,

    /// Organization (or instance) owning the aggregate
    pub resource_owner: String,

    /// Aggregate type acting as the fact's scope
    pub aggregate_type: AggregateType,

    /// Aggregate ID acting as the fact's scope ID
    pub aggregate_id: String,

    /// Kind of object the fact describes, e.g. `org_member_role`
    pub object_type: String,

    /// Object within the scope, e.g. a user ID or a role name
    pub object_id: String,

    /// Field name, e.g. `org_role` or `permission`
    pub field_name: String,

    /// Field value
    pub value: Value,

    /// Duplicate `(tenant, field_name, value)` inserts must fail
    pub value_must_be_unique: bool,

    /// Sequence of the producing event; de-duplication token
    pub revision: u64,
}

/// Exact-match criteria for field retraction and search
///
/// Unset members match everything; `matches` is the conjunction of the
/// set ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    /// Tenant to search in (always set by callers; never cross-tenant)
    pub tenant_id: String,
    /// Restrict to one resource owner (cascading retraction on org removal)
    pub resource_owner: Option<String>,
    /// Restrict to one aggregate type
    pub aggregate_type: Option<AggregateType>,
    /// Restrict to one aggregate
    pub aggregate_id: Option<String>,
    /// Restrict to one object type
    pub object_type: Option<String>,
    /// Restrict to one object
    pub object_id: Option<String>,
    /// Restrict to one field name
    pub field_name: Option<String>,
    /// Restrict to one value
    pub value: Option<Value>,
    /// Retraction guard: only match facts at or below this revision,
    /// so a replayed retraction cannot drop a fact written by a later
    /// event of the same stream
    pub up_to_revision: Option<u64>,
}

impl FieldFilter {
    /// Filter matching all facts of one tenant
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Self::default()
        }
    }

    /// Restrict to one resource owner
    pub fn with_resource_owner(mut self, resource_owner: impl Into<String>) -> Self {
        self.resource_owner = Some(resource_owner.into());
        self
    }

    /// Restrict to one aggregate type
    pub fn with_aggregate_type(mut self, aggregate_type: AggregateType) -> Self {
        self.aggregate_type = Some(aggregate_type);
        self
    }

    /// Restrict to one aggregate
    pub fn with_aggregate_id(mut self, aggregate_id: impl Into<String>) -> Self {
        self.aggregate_id = Some(aggregate_id.into());
        self
    }

    /// Restrict to one object type
    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    /// Restrict to one object
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    /// Restrict to one field name
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    /// Restrict to one value
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Only match facts produced at or below a stream revision
    pub fn with_up_to_revision(mut self, revision: u64) -> Self {
        self.up_to_revision = Some(revision);
        self
    }

    /// Whether a field satisfies every set criterion
    pub fn matches(&self, field: &Field) -> bool {
        if field.tenant_id != self.tenant_id {
            return false;
        }
        if let Some(owner) = &self.resource_owner {
            if &field.resource_owner != owner {
                return false;
            }
        }
        if let Some(t) = self.aggregate_type {
            if field.aggregate_type != t {
                return false;
            }
        }
        if let Some(id) = &self.aggregate_id {
            if &field.aggregate_id != id {
                return false;
            }
        }
        if let Some(t) = &self.object_type {
            if &field.object_type != t {
                return false;
            }
        }
        if let Some(id) = &self.object_id {
            if &field.object_id != id {
                return false;
            }
        }
        if let Some(name) = &self.field_name {
            if &field.field_name != name {
                return false;
            }
        }
        if let Some(value) = &self.value {
            if &field.value != value {
                return false;
            }
        }
        if let Some(revision) = self.up_to_revision {
            if field.revision > revision {
                return false;
            }
        }
        true
    }
}

/// One index mutation produced from an event
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Upsert a fact
    Set(Field),
    /// Retract every fact matching the filter
    Remove(FieldFilter),
}

pub use handlers::{field_ops, FieldProjection};
pub use index::FieldIndex;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_field() -> Field {
        Field {
            tenant_id: "t1".to_string(),
            resource_owner: "org-1".to_string(),
            aggregate_type: AggregateType::Org,
            aggregate_id: "org-1".to_string(),
            object_type: OBJECT_ORG_MEMBER.to_string(),
            object_id: "user-1".to_string(),
            field_name: FIELD_ORG_ROLE.to_string(),
            value: json!("ORG_OWNER"),
            value_must_be_unique: false,
            revision: 3,
        }
    }

    #[test]
    fn test_filter_matches_on_all_set_criteria() {
        let field = test_field();

        let filter = FieldFilter::tenant("t1")
            .with_aggregate_type(AggregateType::Org)
            .with_object_id("user-1")
            .with_value(json!("ORG_OWNER"));
        assert!(filter.matches(&field));

        let wrong_value = FieldFilter::tenant("t1").with_value(json!("IAM_OWNER"));
        assert!(!wrong_value.matches(&field));
    }

    #[test]
    fn test_filter_never_crosses_tenants() {
        let field = test_field();
        assert!(!FieldFilter::tenant("t2").matches(&field));
    }
}
