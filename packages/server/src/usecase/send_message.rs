//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 受信したメッセージを変更せずに全接続へ中継する処理
//!
//! ### なぜこのテストが必要か
//! - 送信者自身を含む全接続に届くことを保証
//! - メッセージの内容（未知のフィールドを含む）が変更されないことを確認
//! - 表示名によるフィルタリングをしないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージの中継
//! - エッジケース：送信者のみが接続している場合、未参加の接続からの送信

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    domain::{BroadcastReport, ConnectionId, ConnectionRepository},
    infrastructure::dto::websocket::ServerEvent,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConnectionRepository>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(repository: Arc<dyn ConnectionRepository>) -> Self {
        Self { repository }
    }

    /// メッセージ送信を実行
    ///
    /// 送信者の名乗り（`sender` など）は検証しない。
    ///
    /// # Arguments
    ///
    /// * `from` - 送信元の接続 ID（ログ用）
    /// * `message` - クライアントが送った JSON オブジェクト
    ///
    /// # Returns
    ///
    /// * `Ok(BroadcastReport)` - 配信結果（受信者 0 でもエラーではない）
    /// * `Err(SendMessageError)` - 送信失敗
    pub async fn execute(
        &self,
        from: &ConnectionId,
        message: Map<String, Value>,
    ) -> Result<BroadcastReport, SendMessageError> {
        let frame = ServerEvent::relay(message)
            .to_frame()
            .map_err(|e| SendMessageError::Encode(e.to_string()))?;

        let report = self.repository.broadcast(frame).await;
        tracing::debug!(
            "Relayed message from '{}' to {} connection(s)",
            from,
            report.delivered
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, ConnectionIdFactory, DisplayName, MockConnectionRepository, Timestamp},
        infrastructure::repository::InMemoryConnectionRepository,
    };
    use serde_json::json;
    use tokio::sync::mpsc;

    async fn open(
        repository: &InMemoryConnectionRepository,
    ) -> (ConnectionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(16);
        let id = ConnectionIdFactory::generate();
        repository
            .add_connection(Connection::new(id.clone(), Timestamp::new(0)), tx)
            .await
            .unwrap();
        (id, rx)
    }

    fn hello() -> Map<String, Value> {
        let Value::Object(map) = json!({
            "id": 1_704_067_200_123_i64,
            "text": "hello",
            "sender": "user",
            "timestamp": "2024-01-01T00:00:00.123Z"
        }) else {
            unreachable!()
        };
        map
    }

    #[tokio::test]
    async fn test_send_message_reaches_sender_and_others_unchanged() {
        // テスト項目: メッセージが送信者を含む全接続に変更なしで届く
        // given (前提条件):
        let repository = Arc::new(InMemoryConnectionRepository::default());
        let (alice, mut rx_alice) = open(&repository).await;
        let (_bob, mut rx_bob) = open(&repository).await;
        let (_carol, mut rx_carol) = open(&repository).await;
        let usecase = SendMessageUseCase::new(repository.clone());

        // when (操作):
        let report = usecase.execute(&alice, hello()).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 3);
        for rx in [&mut rx_alice, &mut rx_bob, &mut rx_carol] {
            let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(frame["event"], "receive_message");
            assert_eq!(frame["data"], Value::Object(hello()));
        }
    }

    #[tokio::test]
    async fn test_send_message_only_sender_connected() {
        // テスト項目: 送信者のみが接続している場合、送信者だけに届く
        // given (前提条件):
        let repository = Arc::new(InMemoryConnectionRepository::default());
        let (alice, mut rx_alice) = open(&repository).await;
        let usecase = SendMessageUseCase::new(repository.clone());

        // when (操作):
        let report = usecase.execute(&alice, hello()).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert!(rx_alice.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_send_message_no_name_filtering() {
        // テスト項目: 同名の参加者 B, C の両方に B のメッセージが届く
        // given (前提条件):
        let repository = Arc::new(InMemoryConnectionRepository::default());
        let (b, mut rx_b) = open(&repository).await;
        let (c, mut rx_c) = open(&repository).await;
        repository
            .join(&b, DisplayName::from("Sam"), Timestamp::new(1))
            .await
            .unwrap();
        repository
            .join(&c, DisplayName::from("Sam"), Timestamp::new(2))
            .await
            .unwrap();
        let usecase = SendMessageUseCase::new(repository.clone());

        // when (操作):
        usecase.execute(&b, hello()).await.unwrap();

        // then (期待する結果):
        assert!(rx_b.recv().await.unwrap().contains("hello"));
        assert!(rx_c.recv().await.unwrap().contains("hello"));
    }

    #[tokio::test]
    async fn test_send_message_zero_recipients_is_not_an_error() {
        // テスト項目: 配信先が 0 件でもエラーにならない（切断との競合）
        // given (前提条件):
        let mut repository = MockConnectionRepository::new();
        repository
            .expect_broadcast()
            .withf(|frame| frame.starts_with(r#"{"event":"receive_message""#))
            .times(1)
            .returning(|_| BroadcastReport::default());
        let usecase = SendMessageUseCase::new(Arc::new(repository));

        // when (操作):
        let result = usecase
            .execute(&ConnectionIdFactory::generate(), hello())
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(BroadcastReport::default()));
    }
}
