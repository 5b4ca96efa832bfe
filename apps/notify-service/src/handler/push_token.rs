//! # 配信先トークン登録ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /push-tokens` - 端末の登録トークンを保存（201 Created）

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::PushTokenUseCaseImpl};

/// 配信先登録 API の共有状態
pub struct PushTokenState {
    pub usecase: PushTokenUseCaseImpl,
}

/// 配信先登録リクエスト
#[derive(Debug, Deserialize)]
pub struct RegisterPushTokenRequest {
    #[serde(default)]
    pub token: String,
    pub email: Option<String>,
}

/// 配信先登録レスポンス
#[derive(Debug, Serialize)]
pub struct RegisterPushTokenResponse {
    pub registered: bool,
}

/// POST /push-tokens
pub async fn register_push_token(
    State(state): State<Arc<PushTokenState>>,
    body: Result<Json<RegisterPushTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterPushTokenResponse>), ApiError> {
    let Json(req) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    state
        .usecase
        .register(&req.token, req.email.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterPushTokenResponse { registered: true }),
    ))
}
