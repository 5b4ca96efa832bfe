//! # メール送信ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /send-email` - 販売登録のお知らせメールを送信
//!
//! 宛先に中継アドレスのみを指定すると、受信 Webhook 経由でプッシュ配信が起動する。

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ApiError, usecase::EmailUseCaseImpl};

/// メール送信 API の共有状態
pub struct EmailState {
    pub usecase: EmailUseCaseImpl,
}

/// メール送信リクエスト
#[derive(Debug, Default, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub property: String,
    /// 宛先の配列（配列でない値は宛先なしとして扱う）
    pub emails:   Option<Value>,
}

impl SendEmailRequest {
    fn recipients(&self) -> Vec<String> {
        match &self.emails {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// メール送信レスポンス
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub message: String,
}

/// POST /send-email
pub async fn send_email(
    State(state): State<Arc<EmailState>>,
    body: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    state
        .usecase
        .send_sale_email(&req.property, &req.recipients())
        .await?;

    Ok(Json(SendEmailResponse {
        message: "Email sent successfully.".to_string(),
    }))
}
