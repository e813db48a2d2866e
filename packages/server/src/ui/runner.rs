//! Router construction and server lifecycle.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    domain::ConnectionRepository,
    error::ServerError,
    infrastructure::repository::InMemoryConnectionRepository,
    ui::{
        handler::{health_check, list_participants, websocket_handler},
        signal::shutdown_signal,
        state::{AppState, SocketGuard},
    },
};

/// How long shutdown waits for open sockets to send their close frames
const SOCKET_DRAIN: Duration = Duration::from_secs(5);

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Result<Router, ServerError> {
    let origin = HeaderValue::from_str(&state.config.allowed_origin)
        .map_err(|_| ServerError::InvalidOrigin(state.config.allowed_origin.clone()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/participants", get(list_participants))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Bind to the configured address and serve until Ctrl-C / SIGTERM
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    serve(listener, config, shutdown_signal()).await
}

/// Serve on `listener` until `signal` resolves.
///
/// The registry lives exactly as long as this call: it is created here and
/// cleared once every socket task has finished (or [`SOCKET_DRAIN`] passed).
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let repository: Arc<dyn ConnectionRepository> = Arc::new(
        InMemoryConnectionRepository::with_capacity(config.max_connections),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sockets, open_sockets) = SocketGuard::channel();
    let state = Arc::new(AppState::new(
        repository.clone(),
        config,
        shutdown_rx,
        sockets,
    ));
    let app = build_router(state)?;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Relay listening on {}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            // Tell open sockets to close so the graceful shutdown can finish
            let _ = shutdown_tx.send(true);
        })
        .await?;

    // Upgraded sockets outlive `axum::serve`
    if !wait_for_sockets(open_sockets, SOCKET_DRAIN).await {
        tracing::warn!("Sockets still open after {:?}", SOCKET_DRAIN);
    }

    let cleared = repository.clear().await;
    tracing::info!("Relay stopped; cleared {} connection(s)", cleared);
    Ok(())
}

/// Wait until every [`SocketGuard`] clone is dropped. Returns `false` on timeout.
async fn wait_for_sockets(mut open_sockets: mpsc::Receiver<()>, limit: Duration) -> bool {
    tokio::time::timeout(limit, open_sockets.recv()).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_origin(origin: &str) -> Arc<AppState> {
        let (_tx, rx) = watch::channel(false);
        let (sockets, _open_sockets) = SocketGuard::channel();
        let config = ServerConfig {
            allowed_origin: origin.to_string(),
            ..ServerConfig::local()
        };
        Arc::new(AppState::new(
            Arc::new(InMemoryConnectionRepository::default()),
            config,
            rx,
            sockets,
        ))
    }

    #[test]
    fn test_build_router_with_default_origin() {
        // テスト項目: 既定のオリジンでルーターを構築できる
        assert!(build_router(state_with_origin("http://localhost:3000")).is_ok());
    }

    #[test]
    fn test_build_router_rejects_invalid_origin() {
        // テスト項目: ヘッダー値にできないオリジンはエラー
        let result = build_router(state_with_origin("http://bad\norigin"));

        assert!(matches!(result, Err(ServerError::InvalidOrigin(_))));
    }

    #[tokio::test]
    async fn test_wait_for_sockets_until_last_guard_dropped() {
        // テスト項目: すべてのソケットのガードが破棄されるまで待つ
        // given (前提条件):
        let (sockets, open_sockets) = SocketGuard::channel();
        let held = sockets.clone();
        drop(sockets);
        let started = tokio::time::Instant::now();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(held);
        });

        // when (操作):
        let drained = wait_for_sockets(open_sockets, Duration::from_secs(5)).await;

        // then (期待する結果):
        assert!(drained);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_wait_for_sockets_gives_up_after_limit() {
        // テスト項目: ガードが残っていれば上限時間で諦める
        let (sockets, open_sockets) = SocketGuard::channel();

        assert!(!wait_for_sockets(open_sockets, Duration::from_millis(50)).await);
        drop(sockets);
    }
}
