//! UseCase: 接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 新しい接続の登録（接続 ID の払い出し、容量チェック）
//!
//! ### なぜこのテストが必要か
//! - 接続数の上限を超えた接続を拒否できることを保証
//! - 接続直後は参加者ではない（Connecting 状態）ことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続
//! - 異常系：容量超過、シャットダウン中

use std::sync::Arc;

use crate::domain::{
    Connection, ConnectionId, ConnectionIdFactory, ConnectionRepository, Outbox, RegistryError,
    RepositoryError, Timestamp,
};

use super::error::ConnectError;

/// 接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConnectionRepository>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(repository: Arc<dyn ConnectionRepository>) -> Self {
        Self { repository }
    }

    /// 接続を登録し、払い出した接続 ID を返す
    ///
    /// # Arguments
    ///
    /// * `outbox` - この接続への送信キュー
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 接続成功
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(&self, outbox: Outbox) -> Result<ConnectionId, ConnectError> {
        let connection_id = ConnectionIdFactory::generate();
        let connection = Connection::new(connection_id.clone(), Timestamp::now());

        match self.repository.add_connection(connection, outbox).await {
            Ok(()) => Ok(connection_id),
            Err(RepositoryError::Registry(RegistryError::CapacityExceeded { capacity, .. })) => {
                Err(ConnectError::RegistryFull { capacity })
            }
            Err(RepositoryError::Registry(RegistryError::DuplicateConnection(id))) => {
                Err(ConnectError::DuplicateConnection(id))
            }
            Err(RepositoryError::Registry(other)) => Err(ConnectError::Rejected(other.to_string())),
            Err(RepositoryError::ShuttingDown) => Err(ConnectError::ShuttingDown),
        }
    }
}
