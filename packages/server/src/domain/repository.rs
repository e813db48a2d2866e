//! Repository trait for the connection registry.
//!
//! The use case layer depends on this trait only; the concrete storage lives
//! in the infrastructure layer (dependency inversion).

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    BroadcastReport, Connection, ConnectionId, DisplayName, Participant, RepositoryError,
    Timestamp,
};

/// Bounded queue of serialized frames waiting to be written to one socket
pub type Outbox = mpsc::Sender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Register an open connection together with its outbox.
    async fn add_connection(
        &self,
        connection: Connection,
        outbox: Outbox,
    ) -> Result<(), RepositoryError>;

    /// Record (or overwrite) the display name of an open connection.
    async fn join(
        &self,
        id: &ConnectionId,
        name: DisplayName,
        joined_at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// Remove a connection and its outbox. Unknown ids return `None`.
    async fn remove_connection(&self, id: &ConnectionId) -> Option<Connection>;

    /// Display name of a joined connection.
    async fn lookup(&self, id: &ConnectionId) -> Option<DisplayName>;

    /// Joined participants, sorted by display name.
    async fn participants(&self) -> Vec<Participant>;

    /// Number of open connections, joined or not.
    async fn count_connections(&self) -> usize;

    /// Queue `frame` to every open connection.
    ///
    /// The registry stays locked for the whole fan-out, so the recipients are
    /// exactly the connections open at that instant. A full or closed outbox
    /// only affects its own recipient.
    async fn broadcast(&self, frame: String) -> BroadcastReport;

    /// Drop every connection and refuse new ones. Returns how many were open.
    async fn clear(&self) -> usize;
}
