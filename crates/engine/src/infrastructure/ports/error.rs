//! Error types for port operations.

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Storage operation failed - includes operation name for tracing.
    #[error("Storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Storage error with operation context.
    pub fn storage(operation: &'static str, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failures reported by a broker adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// The cluster could not be reached or refused an admin request.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// An established connection was lost. The only error that warrants a reconnect.
    #[error("Broker connection lost: {0}")]
    Disconnected(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    /// The consumer will never yield another record.
    #[error("Consumer closed")]
    Closed,

    #[error("Invalid broker configuration: {0}")]
    Config(String),
}

impl BrokerError {
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }
}

/// Why a presence event did not reach the broker.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Presence broker not ready: {0}")]
    NotReady(#[source] BrokerError),

    #[error("Failed to encode presence event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Presence send failed: {0}")]
    Send(#[source] BrokerError),

    /// The send failed, the producer was rebuilt, and the second send failed too.
    #[error("Presence send failed after reconnect: {0}")]
    RetryFailed(#[source] BrokerError),
}
