//! UseCase: チャット参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinChatUseCase::execute() メソッド
//! - 表示名の登録と、参加通知（システムメッセージ）のブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 参加通知が送信者を含む全接続に届くことを保証
//! - 空の表示名や重複した表示名も受け入れることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加と通知
//! - エッジケース：再参加（上書き）、同名の参加者
//! - 異常系：開いていない接続からの参加

use std::sync::Arc;

use crate::{
    domain::{
        BroadcastReport, ChatMessage, ConnectionId, ConnectionRepository, DisplayName,
        MessageIdFactory, RegistryError, RepositoryError, Timestamp,
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::error::JoinChatError;

/// チャット参加のユースケース
pub struct JoinChatUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConnectionRepository>,
    /// システムメッセージの ID 払い出し
    message_ids: Arc<MessageIdFactory>,
}

impl JoinChatUseCase {
    /// 新しい JoinChatUseCase を作成
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_ids: Arc<MessageIdFactory>,
    ) -> Self {
        Self {
            repository,
            message_ids,
        }
    }

    /// 参加を実行
    ///
    /// Registry を更新してから、参加通知を全接続（送信者を含む）へ送る。
    ///
    /// # Returns
    ///
    /// * `Ok((ChatMessage, BroadcastReport))` - 送信した参加通知と配信結果
    /// * `Err(JoinChatError)` - 参加失敗
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        name: DisplayName,
    ) -> Result<(ChatMessage, BroadcastReport), JoinChatError> {
        let now = Timestamp::now();

        // 1. Registry に表示名を登録（既存のエントリは上書き）
        self.repository
            .join(connection_id, name.clone(), now)
            .await
            .map_err(|e| match e {
                RepositoryError::Registry(RegistryError::ConnectionNotFound(id))
                | RepositoryError::Registry(RegistryError::AlreadyDisconnected(id)) => {
                    JoinChatError::NotConnected(id)
                }
                other => JoinChatError::NotConnected(format!("{connection_id} ({other})")),
            })?;

        // 2. 参加通知をブロードキャスト
        let notice = ChatMessage::joined_notice(&name, self.message_ids.next(), now);
        let frame = ServerEvent::system(&notice)
            .and_then(|event| event.to_frame())
            .map_err(|e| JoinChatError::Encode(e.to_string()))?;
        let report = self.repository.broadcast(frame).await;

        Ok((notice, report))
    }
}
