//! # メール送信
//!
//! トランザクションメールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `EmailTransport` trait でメール送信を抽象化
//! - **2 つの実装**: Postmark（本番用）、Noop（開発・テスト用）
//! - **環境変数切替**: `EMAIL_BACKEND` でランタイム選択
//! - **宛先の検証済み保証**: [`EmailMessage`] は検証済みの宛先しか持てないため、
//!   中継アドレスと他の宛先が混在したメールはこの層に到達しない

mod noop;
mod postmark;

use async_trait::async_trait;
use lightestate_domain::email::EmailMessage;
pub use noop::NoopEmailTransport;
pub use postmark::PostmarkEmailTransport;

use crate::error::InfraError;

/// メール送信トレイト
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// メールを送信する
    async fn send(&self, email: &EmailMessage) -> Result<(), InfraError>;
}
