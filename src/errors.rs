//! Error types for the authorization core

use thiserror::Error;

/// Errors that can occur in the event-sourced authorization core
#[derive(Debug, Error)]
pub enum CoreError {
    /// Optimistic concurrency check failed on append
    #[error("Concurrency conflict: {0}")]
    Concurrency(String),

    /// A unique value is already claimed within the tenant
    #[error("Unique constraint violated: {0}")]
    UniqueConstraint(String),

    /// A projection could not interpret a payload it declared interest in
    #[error("Replay error: {0}")]
    Replay(String),

    /// NATS connection error
    #[error("NATS connection error: {0}")]
    Connection(String),

    /// NATS subscribe error
    #[error("NATS subscribe error: {0}")]
    Subscribe(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

impl From<async_nats::Error> for CoreError {
    fn from(err: async_nats::Error) -> Self {
        CoreError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
