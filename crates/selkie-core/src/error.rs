//! Error types for Selkie
//!
//! TigerStyle: Explicit error types with context, using thiserror.

use thiserror::Error;

/// Result type alias for Selkie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Selkie error types
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Actor Errors
    // =========================================================================
    #[error("Actor type not registered: {actor_type}")]
    ActorTypeNotFound { actor_type: String },

    #[error("Actor activation failed: {key}, reason: {reason}")]
    ActivationFailed { key: String, reason: String },

    #[error("Actor invocation failed: {key}, method: {method}, reason: {reason}")]
    InvocationFailed {
        key: String,
        method: String,
        reason: String,
    },

    #[error("Unknown actor method: {method}")]
    UnknownMethod { method: String },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid actor key: {key}, reason: {reason}")]
    InvalidActorKey { key: String, reason: String },

    // =========================================================================
    // State Errors
    // =========================================================================
    #[error("State commit failed: store {store}, reason: {reason}")]
    CommitFailed { store: String, reason: String },

    #[error("State retrieval failed: store {store}, reason: {reason}")]
    StateRetrievalFailed { store: String, reason: String },

    #[error("State backend unreachable: {reason}")]
    BackendUnavailable { reason: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Serialization failed: {reason}")]
    SerializationFailed { reason: String },

    #[error("Deserialization failed: {reason}")]
    DeserializationFailed { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an actor-type-not-registered error
    pub fn actor_type_not_found(actor_type: impl Into<String>) -> Self {
        Self::ActorTypeNotFound {
            actor_type: actor_type.into(),
        }
    }

    /// Create an activation failed error
    pub fn activation_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActivationFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invocation failed error
    pub fn invocation_failed(
        key: impl Into<String>,
        method: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvocationFailed {
            key: key.into(),
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Create a commit failed error
    pub fn commit_failed(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommitFailed {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Create a state retrieval failed error
    pub fn state_retrieval_failed(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StateRetrievalFailed {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error maps to a not-found response
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ActorTypeNotFound { .. })
    }
}
