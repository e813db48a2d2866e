//! Core domain models for the chat relay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    error::RegistryError,
    value_object::{ConnectionId, DisplayName, MessageId, Timestamp},
};

/// Default maximum number of simultaneously open connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Lifecycle state of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Transport is open, no `join_chat` received yet
    Connecting,
    /// `join_chat` received; a display name is recorded
    Joined,
    /// Transport closed
    Disconnected,
}

/// An open transport connection and its participant entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Connection identifier
    pub id: ConnectionId,
    /// Timestamp when the transport connected
    pub connected_at: Timestamp,
    state: ConnectionState,
    display_name: Option<DisplayName>,
    joined_at: Option<Timestamp>,
}

impl Connection {
    /// Create a connection in the `Connecting` state
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            connected_at,
            state: ConnectionState::Connecting,
            display_name: None,
            joined_at: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    /// Record the display name. A second join overwrites the first.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::AlreadyDisconnected` once the connection closed
    pub fn join(&mut self, name: DisplayName, joined_at: Timestamp) -> Result<(), RegistryError> {
        if self.state == ConnectionState::Disconnected {
            return Err(RegistryError::AlreadyDisconnected(
                self.id.as_str().to_string(),
            ));
        }
        self.display_name = Some(name);
        self.joined_at = Some(joined_at);
        self.state = ConnectionState::Joined;
        Ok(())
    }

    /// Move to `Disconnected`
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Participant entry, present once the connection joined
    pub fn participant(&self) -> Option<Participant> {
        match (&self.display_name, self.joined_at) {
            (Some(name), Some(joined_at)) => Some(Participant {
                connection_id: self.id.clone(),
                display_name: name.clone(),
                joined_at,
            }),
            _ => None,
        }
    }
}

/// A joined participant (connection id → display name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub display_name: DisplayName,
    pub joined_at: Timestamp,
}

/// Registry of open connections, bounded by `capacity`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    connections: BTreeMap<ConnectionId, Connection>,
    capacity: usize,
}

impl Registry {
    /// Create an empty registry with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CONNECTIONS)
    }

    /// Create an empty registry with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            connections: BTreeMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Register an open connection
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::CapacityExceeded` if the registry is full and
    /// `RegistryError::DuplicateConnection` if the id is already present
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), RegistryError> {
        if self.connections.len() >= self.capacity {
            return Err(RegistryError::CapacityExceeded {
                capacity: self.capacity,
                current: self.connections.len(),
            });
        }
        if self.connections.contains_key(&connection.id) {
            return Err(RegistryError::DuplicateConnection(
                connection.id.into_string(),
            ));
        }
        self.connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    /// Record a display name for an open connection
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ConnectionNotFound` if the connection is not open
    pub fn join(
        &mut self,
        id: &ConnectionId,
        name: DisplayName,
        joined_at: Timestamp,
    ) -> Result<(), RegistryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::ConnectionNotFound(id.as_str().to_string()))?;
        connection.join(name, joined_at)
    }

    /// Remove a connection. Unknown ids return `None`.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        let mut connection = self.connections.remove(id)?;
        connection.disconnect();
        Some(connection)
    }

    pub fn lookup(&self, id: &ConnectionId) -> Option<&DisplayName> {
        self.connections.get(id).and_then(Connection::display_name)
    }

    /// Joined participants, sorted by display name then connection id
    pub fn participants(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self
            .connections
            .values()
            .filter_map(Connection::participant)
            .collect();
        participants.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        participants
    }

    /// Drop every connection, returning how many were open
    pub fn clear(&mut self) -> usize {
        let count = self.connections.len();
        self.connections.clear();
        count
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    User,
    System,
}

/// A chat message composed by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: String,
    pub sender: SenderKind,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// "<name> joined the chat"
    pub fn joined_notice(name: &DisplayName, id: MessageId, timestamp: Timestamp) -> Self {
        Self {
            id,
            text: format!("{name}님이 채팅에 참여했습니다."),
            sender: SenderKind::System,
            timestamp,
        }
    }

    /// "<name> left the chat room"
    pub fn left_notice(name: &DisplayName, id: MessageId, timestamp: Timestamp) -> Self {
        Self {
            id,
            text: format!("{name}님이 채팅방을 나갔습니다."),
            sender: SenderKind::System,
            timestamp,
        }
    }
}

/// Outcome of a fan-out to every open connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    /// Frames queued into a recipient's outbox
    pub delivered: usize,
    /// Frames dropped because a recipient's outbox was full
    pub dropped: usize,
    /// Recipients whose writer already stopped
    pub closed: usize,
}

impl BroadcastReport {
    /// Number of connections the broadcast was addressed to
    pub fn recipients(&self) -> usize {
        self.delivered + self.dropped + self.closed
    }
}
