//! WebSocket connection handlers.
//!
//! Each socket runs two tasks: a reader that drives the connection through
//! `Connecting → Joined → Disconnected` one frame at a time, and a writer
//! that drains the connection's bounded outbox into the socket and pings the
//! client. The reader is never cancelled mid-frame; when the writer stops it
//! signals the reader, which exits before taking the next frame.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::{HeaderMap, StatusCode, header::ORIGIN},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, Stream, StreamExt},
};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

use crate::{
    domain::{ConnectionId, DisplayName, Outbox},
    infrastructure::dto::websocket::{ClientEvent, InboundError, ServerEvent},
    ui::{
        handler::heartbeat::{Heartbeat, Liveness},
        state::AppState,
    },
    usecase::{
        ConnectError, ConnectParticipantUseCase, DisconnectParticipantUseCase, JoinChatUseCase,
        SendMessageUseCase,
    },
};

/// How long the writer may take to finish after the reader stops
const CLOSE_GRACE: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    if !origin_allowed(&headers, &state.config.allowed_origin) {
        tracing::warn!(
            "Rejecting WebSocket handshake from origin {:?}",
            headers.get(ORIGIN)
        );
        return Err(StatusCode::FORBIDDEN);
    }

    // Create a bounded outbox for this connection
    let (tx, rx) = mpsc::channel(state.config.outbox_capacity());

    let connect_usecase = ConnectParticipantUseCase::new(state.repository.clone());
    let connection_id = match connect_usecase.execute(tx.clone()).await {
        Ok(id) => id,
        Err(ConnectError::RegistryFull { capacity }) => {
            tracing::warn!(
                "Relay is full ({} connections). Rejecting connection.",
                capacity
            );
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        Err(ConnectError::ShuttingDown) => {
            tracing::info!("Rejecting connection during shutdown");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    tracing::info!("Connection '{}' registered", connection_id);

    // Registered before the upgrade completes, so undo it if the upgrade fails
    let failed_state = state.clone();
    let failed_id = connection_id.clone();
    let guard = state.sockets.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade failed for '{}': {}", failed_id, e);
            tokio::spawn(async move {
                failed_state.repository.remove_connection(&failed_id).await;
            });
        })
        .on_upgrade(move |socket| {
            let span = tracing::info_span!("connection", id = %connection_id);
            async move {
                handle_socket(socket, state, connection_id, tx, rx).await;
                drop(guard);
            }
            .instrument(span)
        }))
}

/// Requests without an `Origin` header come from non-browser clients and are
/// accepted; browser requests must come from the configured origin.
pub fn origin_allowed(headers: &HeaderMap, allowed_origin: &str) -> bool {
    match headers.get(ORIGIN) {
        None => true,
        Some(origin) => origin.as_bytes() == allowed_origin.as_bytes(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadOutcome {
    /// The client sent a close frame or the stream ended
    ClientClosed,
    TransportError,
    /// The writer stopped first
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    OutboxClosed,
    WriteFailed,
    Shutdown,
    /// Close handshake answered
    ClientClosed,
    /// The reader ended without a close handshake
    ReaderGone,
    /// No frame from the client within the idle window
    Unresponsive,
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    reply: Outbox,
    rx: mpsc::Receiver<String>,
) {
    let (sink, stream) = socket.split();
    let liveness = Arc::new(Liveness::new());
    let heartbeat = state
        .config
        .idle_timeout()
        .map(|window| Heartbeat::new(window, liveness.clone()));
    // reader → writer: the client closed, answer the handshake
    let (closed_tx, closed_rx) = oneshot::channel::<()>();
    // writer → reader: resolves when the writer ends (sent or dropped)
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    // Drain the outbox into the socket
    let shutdown = state.shutdown.clone();
    let mut send_task = tokio::spawn(
        async move {
            let outcome = write_loop(sink, rx, shutdown, closed_rx, heartbeat).await;
            drop(stop_tx);
            outcome
        }
        .in_current_span(),
    );

    // Handle frames from this client one at a time
    let reader_state = state.clone();
    let reader_id = connection_id.clone();
    let recv_task = tokio::spawn(
        async move {
            let outcome =
                read_loop(stream, &reader_state, &reader_id, &reply, &liveness, stop_rx).await;
            if outcome == ReadOutcome::ClientClosed {
                let _ = closed_tx.send(());
            }
            outcome
        }
        .in_current_span(),
    );

    // The reader always runs to completion so a join is never cut in half
    match recv_task.await {
        Ok(outcome) => tracing::debug!("Reader finished: {:?}", outcome),
        Err(e) => tracing::warn!("Reader task failed: {}", e),
    }
    match tokio::time::timeout(CLOSE_GRACE, &mut send_task).await {
        Ok(Ok(outcome)) => tracing::debug!("Writer finished: {:?}", outcome),
        Ok(Err(e)) => tracing::warn!("Writer task failed: {}", e),
        Err(_) => {
            tracing::debug!("Writer did not finish within {:?}", CLOSE_GRACE);
            send_task.abort();
        }
    }

    let disconnect_usecase =
        DisconnectParticipantUseCase::new(state.repository.clone(), state.message_ids.clone());
    match disconnect_usecase.execute(&connection_id).await {
        Ok(Some((notice, report))) => {
            tracing::info!(
                "Connection '{}' left; notice {} sent to {} connection(s)",
                connection_id,
                notice.id,
                report.delivered
            );
        }
        Ok(None) => {
            tracing::info!("Connection '{}' closed without joining", connection_id);
        }
        Err(e) => {
            tracing::warn!("Failed to announce departure of '{}': {}", connection_id, e);
        }
    }
}

async fn read_loop<S>(
    mut stream: S,
    state: &AppState,
    connection_id: &ConnectionId,
    reply: &Outbox,
    liveness: &Liveness,
    mut stop: oneshot::Receiver<()>,
) -> ReadOutcome
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        // Only cancelled while waiting; a frame already taken is handled fully
        let next = tokio::select! {
            biased;
            _ = &mut stop => return ReadOutcome::Stopped,
            next = stream.next() => next,
        };

        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error: {}", e);
                return ReadOutcome::TransportError;
            }
            None => return ReadOutcome::ClientClosed,
        };
        liveness.mark_alive();

        match msg {
            Message::Text(text) => {
                tracing::debug!("Received text: {}", text.as_str());
                handle_text(state, connection_id, reply, text.as_str()).await;
            }
            Message::Binary(_) => reply_error(reply, &InboundError::UnsupportedFrame),
            Message::Ping(_) | Message::Pong(_) => {
                // Pings are answered by the protocol layer
                tracing::trace!("Received ping/pong");
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection_id);
                return ReadOutcome::ClientClosed;
            }
        }
    }
}

async fn handle_text(state: &AppState, connection_id: &ConnectionId, reply: &Outbox, text: &str) {
    match ClientEvent::parse(text) {
        Ok(ClientEvent::JoinChat(payload)) => {
            let usecase =
                JoinChatUseCase::new(state.repository.clone(), state.message_ids.clone());
            match usecase
                .execute(connection_id, DisplayName::new(payload.username))
                .await
            {
                Ok((notice, report)) => tracing::info!(
                    "Connection '{}' joined; notice {} sent to {} connection(s)",
                    connection_id,
                    notice.id,
                    report.delivered
                ),
                Err(e) => tracing::warn!("Join failed for '{}': {}", connection_id, e),
            }
        }
        Ok(ClientEvent::SendMessage(message)) => {
            let usecase = SendMessageUseCase::new(state.repository.clone());
            if let Err(e) = usecase.execute(connection_id, message).await {
                tracing::warn!("Failed to relay message from '{}': {}", connection_id, e);
            }
        }
        Err(e) => {
            tracing::warn!("Rejected frame from '{}': {}", connection_id, e);
            reply_error(reply, &e);
        }
    }
}

/// Queue an `error` event for this connection only.
fn reply_error(reply: &Outbox, err: &InboundError) {
    match ServerEvent::error(err).to_frame() {
        Ok(frame) => {
            if reply.try_send(frame).is_err() {
                tracing::warn!("Outbox full or closed, dropping error event");
            }
        }
        Err(e) => tracing::error!("Failed to encode error event: {}", e),
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
    mut client_closed: oneshot::Receiver<()>,
    mut heartbeat: Option<Heartbeat>,
) -> WriteOutcome {
    let stopping = *shutdown.borrow();
    if stopping {
        let _ = sink.send(Message::Close(Some(shutdown_frame()))).await;
        return WriteOutcome::Shutdown;
    }

    loop {
        tokio::select! {
            frame = outbox.recv() => {
                let Some(frame) = frame else { return WriteOutcome::OutboxClosed };
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    tracing::debug!("Write failed: {}", e);
                    return WriteOutcome::WriteFailed;
                }
            }
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(Some(shutdown_frame()))).await;
                return WriteOutcome::Shutdown;
            }
            closed = &mut client_closed => {
                if closed.is_err() {
                    return WriteOutcome::ReaderGone;
                }
                // Flushes the close reply queued when the client's frame arrived
                let _ = sink.close().await;
                return WriteOutcome::ClientClosed;
            }
            alive = next_beat(&mut heartbeat) => {
                if !alive {
                    tracing::info!("Client stopped answering pings, closing");
                    let _ = sink.send(Message::Close(Some(idle_frame()))).await;
                    return WriteOutcome::Unresponsive;
                }
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    tracing::debug!("Ping failed: {}", e);
                    return WriteOutcome::WriteFailed;
                }
            }
        }
    }
}

/// Next heartbeat check; never resolves when the idle timeout is disabled.
async fn next_beat(heartbeat: &mut Option<Heartbeat>) -> bool {
    match heartbeat {
        Some(heartbeat) => heartbeat.beat().await,
        None => std::future::pending().await,
    }
}

fn shutdown_frame() -> CloseFrame {
    CloseFrame {
        code: close_code::AWAY,
        reason: Utf8Bytes::from_static("server shutting down"),
    }
}

fn idle_frame() -> CloseFrame {
    CloseFrame {
        code: close_code::POLICY,
        reason: Utf8Bytes::from_static("idle timeout"),
    }
}
