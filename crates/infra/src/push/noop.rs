//! Noop プッシュ送信実装
//!
//! 通知を実際に送信せず、ログ出力のみ行う。
//! 開発環境やプッシュ通知無効化時に使用する。

use async_trait::async_trait;
use lightestate_domain::push::{NotificationPayload, PushSendError, PushToken};

use super::PushTransport;

/// Noop プッシュ送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopPushTransport;

#[async_trait]
impl PushTransport for NoopPushTransport {
    async fn send(
        &self,
        token: &PushToken,
        payload: &NotificationPayload,
    ) -> Result<(), PushSendError> {
        tracing::info!(
            token = %token,
            title = %payload.title,
            "Noop: プッシュ送信をスキップ"
        );
        Ok(())
    }
}
