//! Rendering of relay events for the terminal.

use chrono::{DateTime, FixedOffset, Local, Offset};
use madang_server::infrastructure::dto::websocket::ServerEvent;
use serde_json::Value;

/// Formats incoming frames, showing times in a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    offset: FixedOffset,
}

impl Formatter {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Use the machine's current UTC offset
    pub fn local() -> Self {
        Self::new(Local::now().offset().fix())
    }

    /// One printable line for a text frame, or `None` if there is nothing to show.
    pub fn format_frame(&self, frame: &str) -> Option<String> {
        match serde_json::from_str::<ServerEvent>(frame) {
            Ok(ServerEvent::ReceiveMessage(message)) => self.format_message(&message),
            Ok(ServerEvent::Error(err)) => Some(format!("[error] {}: {}", err.code, err.message)),
            Err(e) => {
                tracing::debug!("Ignoring unrecognized frame: {}", e);
                None
            }
        }
    }

    fn format_message(&self, message: &Value) -> Option<String> {
        let text = message.get("text")?.as_str()?;

        if message.get("sender").and_then(Value::as_str) == Some("system") {
            return Some(format!("[system] {}", text));
        }

        let time = message
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&self.offset).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());

        match message.get("username").and_then(Value::as_str) {
            Some(name) => Some(format!("[{}] {}: {}", time, name, text)),
            None => Some(format!("[{}] {}", time, text)),
        }
    }
}
