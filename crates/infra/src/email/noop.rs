//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 開発環境やメール送信無効化時に使用する。

use async_trait::async_trait;
use lightestate_domain::email::EmailMessage;

use super::EmailTransport;
use crate::error::InfraError;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopEmailTransport;

#[async_trait]
impl EmailTransport for NoopEmailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<(), InfraError> {
        tracing::info!(
            to = %email.recipients.addresses().join(","),
            subject = %email.subject,
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}
