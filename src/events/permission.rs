// Copyright (c) 2025 - Cowboy AI, Inc.
//! Role-Permission Mapping Events

use serde::{Deserialize, Serialize};

use crate::domain::{Permission, Role};

/// Events of the permission aggregate
///
/// These maintain the tenant-wide mapping from roles to the permissions
/// they grant. The aggregate id is the tenant itself: one stream per
/// tenant holds the whole mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PermissionEvent {
    /// Role grants a permission from now on
    RolePermissionAdded { role: Role, permission: Permission },

    /// Role no longer grants a permission
    RolePermissionRemoved { role: Role, permission: Permission },
}

impl PermissionEvent {
    /// Dotted event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            PermissionEvent::RolePermissionAdded { .. } => "permission.role_permission.added",
            PermissionEvent::RolePermissionRemoved { .. } => "permission.role_permission.removed",
        }
    }
}
