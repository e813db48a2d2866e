//! UseCase 層のエラー定義

use thiserror::Error;

/// 接続処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Relay is full: maximum {capacity} connections allowed")]
    RegistryFull { capacity: usize },

    #[error("Relay is shutting down")]
    ShuttingDown,

    #[error("Connection id collision: {0}")]
    DuplicateConnection(String),

    #[error("Connection rejected: {0}")]
    Rejected(String),
}

/// join_chat 処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinChatError {
    #[error("Connection '{0}' is not open")]
    NotConnected(String),

    #[error("Failed to encode join notice: {0}")]
    Encode(String),
}

/// send_message 処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("Failed to encode relayed message: {0}")]
    Encode(String),
}

/// 切断処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisconnectError {
    #[error("Failed to encode leave notice: {0}")]
    Encode(String),
}
