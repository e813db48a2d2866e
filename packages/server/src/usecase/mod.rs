//! UseCase 層
//!
//! リレーのビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod join_chat;
pub mod send_message;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, DisconnectError, JoinChatError, SendMessageError};
pub use join_chat::JoinChatUseCase;
pub use send_message::SendMessageUseCase;
