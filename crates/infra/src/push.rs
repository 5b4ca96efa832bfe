//! # プッシュ送信
//!
//! 端末へのプッシュ通知送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `PushTransport` trait で送信手段を抽象化
//! - **3 つの実装**: FCM HTTP v1（本番用）、FCM legacy（サーバーキー）、Noop（開発用）
//! - **環境変数切替**: `PUSH_BACKEND` でランタイム選択
//! - **エラー分類**: 送信失敗が恒久的（トークン無効）かどうかは各実装が判定し、
//!   [`PushSendError::permanent`] で一斉配信側に伝える

mod fcm_legacy;
mod fcm_v1;
mod noop;

use async_trait::async_trait;
pub use fcm_legacy::FcmLegacyTransport;
pub use fcm_v1::FcmV1Transport;
use lightestate_domain::push::{NotificationPayload, PushSendError, PushToken};
pub use noop::NoopPushTransport;

use crate::error::InfraError;

/// 通信エラー時のエラーコード
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
/// アクセストークン取得失敗時のエラーコード
pub const AUTH_ERROR: &str = "AUTH_ERROR";

/// プッシュ送信トレイト
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// 一斉配信の開始前に一度だけ呼ばれる準備処理
    ///
    /// 認証情報の取得など、配信先ごとに繰り返す必要のない処理を行う。
    /// ここで失敗した場合、配信は 1 件も試行されない。
    async fn prepare(&self) -> Result<(), InfraError> {
        Ok(())
    }

    /// 1 件の配信先に送信する
    async fn send(
        &self,
        token: &PushToken,
        payload: &NotificationPayload,
    ) -> Result<(), PushSendError>;
}

/// HTTP 通信エラーを一時的な送信失敗に変換する
fn network_error(e: &reqwest::Error) -> PushSendError {
    PushSendError::transient(NETWORK_ERROR, e.to_string())
}
