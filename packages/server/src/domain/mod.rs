//! Domain layer for the chat relay.
//!
//! This module contains the connection lifecycle and message rules that are
//! independent of data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{
    BroadcastReport, ChatMessage, Connection, ConnectionState, DEFAULT_MAX_CONNECTIONS,
    Participant, Registry, SenderKind,
};
pub use error::{RegistryError, RepositoryError, ValueObjectError};
pub use factory::{ConnectionIdFactory, MessageIdFactory};
pub use repository::{ConnectionRepository, Outbox};
pub use value_object::{ConnectionId, DisplayName, MessageId, Timestamp};

#[cfg(test)]
pub use repository::MockConnectionRepository;
