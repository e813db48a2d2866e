//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 接続の削除と、退出通知（システムメッセージ）のブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 参加済みの接続が切断されたとき、残りの接続に退出通知が届くことを保証
//! - 未参加・未登録の接続の切断では通知を送らないことを確認（冪等性）
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の接続の切断、未参加の接続の切断、二重切断

use std::sync::Arc;

use crate::{
    domain::{
        BroadcastReport, ChatMessage, ConnectionId, ConnectionRepository, MessageIdFactory,
        Timestamp,
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::error::DisconnectError;

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConnectionRepository>,
    /// システムメッセージの ID 払い出し
    message_ids: Arc<MessageIdFactory>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_ids: Arc<MessageIdFactory>,
    ) -> Self {
        Self {
            repository,
            message_ids,
        }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(..))` - 参加済みだったため退出通知を送信した
    /// * `Ok(None)` - 未参加または未登録（何もしない）
    /// * `Err(DisconnectError)` - 通知のエンコード失敗（接続は削除済み）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<(ChatMessage, BroadcastReport)>, DisconnectError> {
        // 1. Registry から削除（存在しなければ何もしない）
        let Some(connection) = self.repository.remove_connection(connection_id).await else {
            tracing::debug!("Connection '{}' was not registered", connection_id);
            return Ok(None);
        };

        // 2. 参加済みなら残りの接続へ退出通知
        let Some(name) = connection.display_name() else {
            return Ok(None);
        };
        let notice = ChatMessage::left_notice(name, self.message_ids.next(), Timestamp::now());
        let frame = ServerEvent::system(&notice)
            .and_then(|event| event.to_frame())
            .map_err(|e| DisconnectError::Encode(e.to_string()))?;
        let report = self.repository.broadcast(frame).await;

        Ok(Some((notice, report)))
    }
}
