//! # 受信 Webhook ハンドラ
//!
//! Postmark の受信 Webhook（Inbound）から呼ばれる。中継アドレス宛てのメールを
//! 受け取ると、件名・本文を通知内容として登録済みの全端末へ一斉配信する。
//!
//! ## エンドポイント
//!
//! - `POST /webhook` - 受信メールの中継
//!
//! レスポンスは他のエンドポイントと異なり `{ok, ...}` 形式で返す。
//!
//! ```json
//! { "ok": true, "sent": 3, "failed": 0 }
//! { "ok": false, "message": "Email was not addressed to the relay address." }
//! ```

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lightestate_domain::email::InboundEmail;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::InboundRelayUseCaseImpl};

/// 受信 Webhook の共有状態
pub struct RelayState {
    pub usecase: InboundRelayUseCaseImpl,
}

/// Postmark 受信 Webhook のペイロード（使用する項目のみ）
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundWebhookPayload {
    #[serde(default)]
    pub to_full:   Vec<InboundAddress>,
    #[serde(default)]
    pub to:        Option<String>,
    #[serde(default)]
    pub subject:   String,
    #[serde(default)]
    pub text_body: String,
}

/// `ToFull` の要素
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundAddress {
    pub email: String,
}

impl InboundWebhookPayload {
    /// 宛先アドレスを集める
    ///
    /// `ToFull` を優先し、なければ `To` ヘッダー（カンマ区切り、
    /// `"Name" <addr>` 形式可）から取り出す。
    fn recipients(&self) -> Vec<String> {
        if !self.to_full.is_empty() {
            return self.to_full.iter().map(|a| a.email.clone()).collect();
        }
        self.to
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(extract_address)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn into_inbound_email(self) -> InboundEmail {
        InboundEmail {
            recipients: self.recipients(),
            subject:    self.subject,
            text_body:  self.text_body,
        }
    }
}

fn extract_address(entry: &str) -> &str {
    let entry = entry.trim();
    match (entry.rfind('<'), entry.rfind('>')) {
        (Some(start), Some(end)) if start < end => entry[start + 1..end].trim(),
        _ => entry,
    }
}

/// Webhook 成功レスポンス
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub ok:     bool,
    pub sent:   usize,
    pub failed: usize,
}

/// Webhook 失敗レスポンス
#[derive(Debug, Serialize)]
pub struct WebhookErrorResponse {
    pub ok:      bool,
    pub message: String,
}

impl WebhookErrorResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            ok:      false,
            message: message.into(),
        }
    }
}

/// Webhook 用の形式でエラーを返すラッパー
pub struct WebhookError(ApiError);

impl From<ApiError> for WebhookError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        self.0.log();
        (
            self.0.status_code(),
            Json(WebhookErrorResponse::new(self.0.public_message())),
        )
            .into_response()
    }
}

/// POST /webhook
pub async fn webhook(
    State(state): State<Arc<RelayState>>,
    body: Result<Json<InboundWebhookPayload>, JsonRejection>,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let Json(payload) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    let result = state.usecase.relay(&payload.into_inbound_email()).await?;
    Ok(Json(WebhookResponse {
        ok:     true,
        sent:   result.sent_count,
        failed: result.failed_count,
    }))
}

/// POST 以外のメソッド
pub async fn webhook_method_not_allowed() -> (StatusCode, Json<WebhookErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(WebhookErrorResponse::new("Only POST allowed")),
    )
}
