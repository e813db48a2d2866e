//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConnectionId validation error
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    /// ConnectionId invalid format error (not a valid UUID format)
    #[error("ConnectionId must be a valid UUID format (got: {0})")]
    ConnectionIdInvalidFormat(String),
}

/// Errors related to Registry domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Registry capacity exceeded error
    #[error("Registry capacity exceeded: maximum {capacity} connections allowed (current: {current})")]
    CapacityExceeded { capacity: usize, current: usize },

    /// The connection is not open
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// The connection id is already registered
    #[error("Connection already registered: {0}")]
    DuplicateConnection(String),

    /// A connection that already left cannot change state
    #[error("Connection '{0}' is already disconnected")]
    AlreadyDisconnected(String),
}

/// Errors returned by a `ConnectionRepository`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The registry was cleared for shutdown and accepts no new connections
    #[error("Registry is shutting down")]
    ShuttingDown,
}
