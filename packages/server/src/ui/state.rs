//! Server state shared by the handlers.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{
    config::ServerConfig,
    domain::{ConnectionRepository, MessageIdFactory},
};

/// Shared application state
pub struct AppState {
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn ConnectionRepository>,
    /// Ids for system messages, shared so they stay unique across connections
    pub message_ids: Arc<MessageIdFactory>,
    pub config: ServerConfig,
    /// Flips to `true` once the server starts shutting down
    pub shutdown: watch::Receiver<bool>,
    /// Cloned into every socket task
    pub sockets: SocketGuard,
}

/// Held by each socket task until it ends.
///
/// Shutdown waits until every clone is dropped, so close frames are flushed
/// before the process exits.
#[derive(Debug, Clone)]
pub struct SocketGuard {
    _held: mpsc::Sender<()>,
}

impl SocketGuard {
    /// A guard plus the receiver that resolves once every clone is gone
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { _held: tx }, rx)
    }
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        config: ServerConfig,
        shutdown: watch::Receiver<bool>,
        sockets: SocketGuard,
    ) -> Self {
        Self {
            repository,
            message_ids: Arc::new(MessageIdFactory::new()),
            config,
            shutdown,
            sockets,
        }
    }
}
