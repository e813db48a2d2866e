//! WebSocket message DTOs for the chat relay.
//!
//! Every frame is a JSON text frame shaped `{ "event": <name>, "data": <payload> }`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{ChatMessage, SenderKind};

/// Event name of the inbound join request
pub const JOIN_CHAT: &str = "join_chat";
/// Event name of an inbound chat message
pub const SEND_MESSAGE: &str = "send_message";

/// `join_chat` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinChatPayload {
    pub username: String,
}

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinChat(JoinChatPayload),
    /// Kept as the raw JSON object so it can be relayed verbatim
    SendMessage(Map<String, Value>),
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Reasons an inbound frame is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InboundError {
    #[error("Frame is not a JSON event envelope: {0}")]
    InvalidJson(String),

    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    #[error("Malformed '{event}' payload: {reason}")]
    MalformedPayload { event: String, reason: String },

    #[error("Only text frames are supported")]
    UnsupportedFrame,
}

impl InboundError {
    /// Machine-readable code sent back in the `error` event
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) | Self::MalformedPayload { .. } => "malformed_payload",
            Self::UnknownEvent(_) => "unknown_event",
            Self::UnsupportedFrame => "unsupported_frame",
        }
    }
}

impl ClientEvent {
    /// Parse one text frame.
    ///
    /// `send_message` must carry a JSON object with a string `text`; every
    /// other field passes through untouched.
    pub fn parse(text: &str) -> Result<Self, InboundError> {
        let envelope: RawEnvelope =
            serde_json::from_str(text).map_err(|e| InboundError::InvalidJson(e.to_string()))?;

        match envelope.event.as_str() {
            JOIN_CHAT => serde_json::from_value::<JoinChatPayload>(envelope.data)
                .map(ClientEvent::JoinChat)
                .map_err(|e| InboundError::MalformedPayload {
                    event: envelope.event,
                    reason: e.to_string(),
                }),
            SEND_MESSAGE => {
                let Value::Object(message) = envelope.data else {
                    return Err(InboundError::MalformedPayload {
                        event: envelope.event,
                        reason: "payload must be an object".to_string(),
                    });
                };
                match message.get("text") {
                    Some(Value::String(_)) => Ok(ClientEvent::SendMessage(message)),
                    _ => Err(InboundError::MalformedPayload {
                        event: envelope.event,
                        reason: "missing string field `text`".to_string(),
                    }),
                }
            }
            _ => Err(InboundError::UnknownEvent(envelope.event)),
        }
    }

    /// Serialize into a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Chat message as it travels on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub id: i64,
    pub text: String,
    pub sender: SenderKind,
    /// ISO 8601 (UTC, milliseconds)
    pub timestamp: String,
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.value(),
            text: message.text.clone(),
            sender: message.sender,
            timestamp: madang_shared::time::millis_to_iso8601(message.timestamp.value()),
        }
    }
}

/// `error` payload, sent only to the offending connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// Events sent by the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Relayed user messages stay as the sender's JSON object
    ReceiveMessage(Value),
    Error(ErrorPayload),
}

impl ServerEvent {
    /// `receive_message` carrying a message composed by the relay
    pub fn system(message: &ChatMessage) -> Result<Self, serde_json::Error> {
        let dto = ChatMessageDto::from(message);
        Ok(Self::ReceiveMessage(serde_json::to_value(dto)?))
    }

    /// `receive_message` carrying a client's message unchanged
    pub fn relay(message: Map<String, Value>) -> Self {
        Self::ReceiveMessage(Value::Object(message))
    }

    pub fn error(err: &InboundError) -> Self {
        Self::Error(ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        })
    }

    /// Serialize into a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
