// Copyright (c) 2025 - Cowboy AI, Inc.
//! Permission and Role Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Permission name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Permission name is empty")]
    Empty,

    #[error("Invalid character in permission name: {0}")]
    InvalidCharacter(char),

    #[error("Permission segment is empty: {0}")]
    EmptySegment(String),
}

/// Dotted permission name, e.g. `org.read` or `project_grant.write`
///
/// # Invariants
/// - Non-empty
/// - Segments separated by dots, none empty
/// - Segments contain only lowercase ASCII alphanumerics and underscores
///
/// # Examples
///
/// ```rust
/// use iam_core::domain::Permission;
///
/// let read = Permission::new("org.read").unwrap();
/// assert_eq!(read.as_str(), "org.read");
///
/// assert!(Permission::new("").is_err());
/// assert!(Permission::new("org..read").is_err());
/// assert!(Permission::new("Org.Read").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Create a new permission name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, PermissionError> {
        let name = name.into();

        if name.is_empty() {
            return Err(PermissionError::Empty);
        }

        for segment in name.split('.') {
            if segment.is_empty() {
                return Err(PermissionError::EmptySegment(name.clone()));
            }
            for ch in segment.chars() {
                if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '_' {
                    return Err(PermissionError::InvalidCharacter(ch));
                }
            }
        }

        Ok(Self(name))
    }

    /// Permission name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role name, e.g. `ORG_OWNER` or `IAM_OWNER`
///
/// Roles are opaque identifiers mapped to permissions through
/// role-permission facts; only emptiness is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a new role name
    pub fn new(name: impl Into<String>) -> Result<Self, PermissionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PermissionError::Empty);
        }
        Ok(Self(name))
    }

    /// Role name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_permissions() {
        for name in ["iam.read", "org.policy.read", "project_grant.write", "a.b2"] {
            assert!(Permission::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_empty_permission_rejected() {
        assert_eq!(Permission::new(""), Err(PermissionError::Empty));
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(matches!(
            Permission::new("org..read"),
            Err(PermissionError::EmptySegment(_))
        ));
        assert!(matches!(
            Permission::new(".read"),
            Err(PermissionError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert_eq!(
            Permission::new("Org.read"),
            Err(PermissionError::InvalidCharacter('O'))
        );
        assert_eq!(
            Permission::new("org read"),
            Err(PermissionError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_role_accepts_upper_snake() {
        let role = Role::new("ORG_OWNER").unwrap();
        assert_eq!(role.as_str(), "ORG_OWNER");
        assert_eq!(Role::new(""), Err(PermissionError::Empty));
    }
}
