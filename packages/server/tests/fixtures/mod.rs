//! Shared helpers for the integration tests.
//!
//! `TestServer` runs the relay in-process on an ephemeral loopback port and
//! stops it when dropped.

#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use madang_server::{ServerConfig, ServerError};
use serde_json::{Value, json};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a frame before giving up
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::local()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(madang_server::serve(listener, config, async {
            let _ = rx.await;
        }));

        Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let handle = self.handle.take().expect("server already stopped");
        tokio::time::timeout(RECV_TIMEOUT, handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn connect(server: &TestServer) -> WsClient {
    let (ws, _) = connect_async(server.ws_url())
        .await
        .expect("Failed to connect");
    ws
}

pub async fn send_event(ws: &mut WsClient, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::text(frame)).await.expect("Failed to send");
}

pub async fn join(ws: &mut WsClient, username: &str) {
    send_event(ws, "join_chat", json!({ "username": username })).await;
}

/// Next text frame as JSON; control frames are skipped.
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
            Message::Close(frame) => panic!("Connection closed: {:?}", frame),
            _ => continue,
        }
    }
}

/// Next `receive_message` payload.
pub async fn next_message(ws: &mut WsClient) -> Value {
    let event = next_event(ws).await;
    assert_eq!(event["event"], "receive_message", "unexpected event: {event}");
    event["data"].clone()
}

/// Assert no text frame arrives within `wait`.
pub async fn assert_silent(ws: &mut WsClient, wait: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, ws.next()).await {
        panic!("Unexpected frame: {}", text.as_str());
    }
}

/// Poll `/api/participants` until `connections` reaches `expected`.
pub async fn wait_for_connections(server: &TestServer, expected: u64) {
    let client = reqwest::Client::new();
    let url = format!("{}/api/participants", server.base_url());
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;

    loop {
        let body: Value = client
            .get(&url)
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        if body["connections"] == expected {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "connections stayed at {} (expected {})",
            body["connections"],
            expected
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
