//! InMemory Connection Repository 実装
//!
//! ドメイン層が定義する ConnectionRepository trait の具体的な実装。
//! `Registry` ドメインモデルと接続ごとの送信キュー（outbox）を
//! 1 つの Mutex で保護します。ブロードキャスト中もロックを保持するため、
//! 配信先はその瞬間に開いている接続と常に一致します。
//!
//! プロセスの再起動で状態はすべて失われます（永続化はしません）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{
    BroadcastReport, Connection, ConnectionId, ConnectionRepository, DisplayName, Outbox,
    Participant, Registry, RepositoryError, Timestamp,
};

struct Inner {
    /// Registry ドメインモデル
    registry: Registry,
    /// 接続ごとの送信キュー
    outboxes: HashMap<ConnectionId, Outbox>,
    /// `clear` 後は false（シャットダウン中）
    accepting: bool,
}

/// インメモリ Connection Repository 実装
pub struct InMemoryConnectionRepository {
    inner: Mutex<Inner>,
}

impl InMemoryConnectionRepository {
    /// 新しい InMemoryConnectionRepository を作成
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Mutex::new(Inner {
                registry,
                outboxes: HashMap::new(),
                accepting: true,
            }),
        }
    }

    /// 指定した上限で作成
    pub fn with_capacity(max_connections: usize) -> Self {
        Self::new(Registry::with_capacity(max_connections))
    }
}

impl Default for InMemoryConnectionRepository {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn add_connection(
        &self,
        connection: Connection,
        outbox: Outbox,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        if !inner.accepting {
            return Err(RepositoryError::ShuttingDown);
        }

        // Registry の検証（容量・重複）が通った場合のみ outbox を登録する
        let id = connection.id.clone();
        inner.registry.add_connection(connection)?;
        inner.outboxes.insert(id, outbox);
        Ok(())
    }

    async fn join(
        &self,
        id: &ConnectionId,
        name: DisplayName,
        joined_at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        inner.registry.join(id, name, joined_at)?;
        Ok(())
    }

    async fn remove_connection(&self, id: &ConnectionId) -> Option<Connection> {
        let mut inner = self.inner.lock().await;
        inner.outboxes.remove(id);
        inner.registry.remove(id)
    }

    async fn lookup(&self, id: &ConnectionId) -> Option<DisplayName> {
        let inner = self.inner.lock().await;
        inner.registry.lookup(id).cloned()
    }

    async fn participants(&self) -> Vec<Participant> {
        let inner = self.inner.lock().await;
        inner.registry.participants()
    }

    async fn count_connections(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.registry.len()
    }

    async fn broadcast(&self, frame: String) -> BroadcastReport {
        let inner = self.inner.lock().await;
        let mut report = BroadcastReport::default();

        for (id, outbox) in inner.outboxes.iter() {
            match outbox.try_send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    tracing::warn!("Outbox full, dropping frame for connection '{}'", id);
                }
                Err(TrySendError::Closed(_)) => {
                    report.closed += 1;
                    tracing::debug!("Outbox closed for connection '{}'", id);
                }
            }
        }

        report
    }

    async fn clear(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.accepting = false;
        inner.outboxes.clear();
        inner.registry.clear()
    }
}
