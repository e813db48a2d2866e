//! Interactive chat session.
//!
//! Lines typed at the prompt are read on a dedicated thread (rustyline
//! blocks) and handed to the async loop, which multiplexes them with frames
//! arriving from the relay.

use std::thread;

use futures_util::{SinkExt, StreamExt};
use madang_server::infrastructure::dto::websocket::{ClientEvent, JoinChatPayload};
use rustyline::{DefaultEditor, error::ReadlineError};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{config::ClientConfig, error::ClientError, formatter::Formatter};

const QUIT_COMMAND: &str = "/quit";

/// What to do with one line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Send(String),
    Quit,
    Skip,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed == QUIT_COMMAND {
            Self::Quit
        } else if trimmed.is_empty() {
            Self::Skip
        } else {
            Self::Send(line.to_string())
        }
    }
}

/// `join_chat` event announcing `username`
pub fn join_event(username: &str) -> ClientEvent {
    ClientEvent::JoinChat(JoinChatPayload {
        username: username.to_string(),
    })
}

/// `send_message` event shaped like the browser client's messages, plus the
/// author's name so other terminals can show it.
pub fn message_event(text: &str, username: &str, now_millis: i64) -> ClientEvent {
    let mut message = Map::new();
    message.insert("id".to_string(), Value::from(now_millis));
    message.insert("text".to_string(), Value::from(text));
    message.insert("sender".to_string(), Value::from("user"));
    message.insert("username".to_string(), Value::from(username));
    message.insert(
        "timestamp".to_string(),
        Value::from(madang_shared::time::millis_to_iso8601(now_millis)),
    );
    ClientEvent::SendMessage(message)
}

/// Connect, join, and chat until `/quit`, EOF, or the relay closes.
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let (ws, _) = connect_async(config.url.as_str())
        .await
        .map_err(|source| ClientError::Connect {
            url: config.url.clone(),
            source,
        })?;
    tracing::info!("Connected to {}", config.url);

    let (mut sink, mut stream) = ws.split();
    sink.send(Message::text(join_event(&config.username).to_frame()?))
        .await?;

    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    let mut editor = DefaultEditor::new().map_err(|e| ClientError::Readline(e.to_string()))?;
    // Not joined: the thread may be parked in readline when the session ends
    thread::spawn(move || read_lines(&mut editor, line_tx));

    let formatter = Formatter::local();

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                match Input::parse(&line) {
                    Input::Quit => break,
                    Input::Skip => continue,
                    Input::Send(text) => {
                        let event = message_event(
                            &text,
                            &config.username,
                            madang_shared::time::now_millis(),
                        );
                        sink.send(Message::text(event.to_frame()?)).await?;
                    }
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(line) = formatter.format_frame(text.as_str()) {
                            println!("{}", line);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.as_str().to_string())
                            .unwrap_or_default();
                        println!("[system] connection closed {}", reason);
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
        }
    }

    let _ = sink.send(Message::Close(None)).await;
    Ok(())
}

fn read_lines(editor: &mut DefaultEditor, lines: mpsc::Sender<String>) {
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if lines.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::warn!("Failed to read line: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_input() {
        // テスト項目: 入力行を送信・終了・スキップに分類する
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(Input::parse("  /quit  "), Input::Quit);
        assert_eq!(Input::parse("   "), Input::Skip);
        assert_eq!(Input::parse("hello"), Input::Send("hello".to_string()));
    }

    #[test]
    fn test_join_event_frame() {
        // テスト項目: join_chat イベントのフレーム形式
        let frame = join_event("Alice").to_frame().unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(value, json!({ "event": "join_chat", "data": { "username": "Alice" } }));
    }

    #[test]
    fn test_message_event_frame() {
        // テスト項目: send_message イベントに id・text・sender・timestamp が入る
        // when (操作):
        let frame = message_event("hello", "Alice", 1_704_067_200_123)
            .to_frame()
            .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();

        // then (期待する結果):
        assert_eq!(value["event"], "send_message");
        assert_eq!(
            value["data"],
            json!({
                "id": 1_704_067_200_123_i64,
                "text": "hello",
                "sender": "user",
                "username": "Alice",
                "timestamp": "2024-01-01T00:00:00.123Z"
            })
        );
    }

    #[test]
    fn test_message_event_is_accepted_by_relay_parser() {
        // テスト項目: 生成したフレームをリレー側のパーサーが受け付ける
        let frame = message_event("hi", "Sam", 0).to_frame().unwrap();

        assert!(matches!(
            ClientEvent::parse(&frame),
            Ok(ClientEvent::SendMessage(_))
        ));
    }
}
