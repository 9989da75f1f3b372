// Copyright (c) 2025 - Cowboy AI, Inc.
//! User Aggregate Events
//!
//! Only the identity-establishing slice of the user aggregate is modeled:
//! the events the login-name resolver joins against.

use serde::{Deserialize, Serialize};

/// Events of the user aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserEvent {
    /// User created with an initial username
    Added { username: String },

    /// Username changed
    UsernameChanged { username: String },

    /// User removed (terminal)
    Removed,
}

impl UserEvent {
    /// Dotted event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Added { .. } => "user.added",
            UserEvent::UsernameChanged { .. } => "user.username.changed",
            UserEvent::Removed => "user.removed",
        }
    }
}
