//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス構造体 `{ "error": ..., "detail": ... }` を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービス側の責務（shared に axum 依存を入れない）
//! - `detail` は上流サービスのエラー内容など、利用者の調査に役立つ情報のみを載せる。
//!   認証情報の取得失敗では `detail` を付けない

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error:  String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    /// メッセージのみのエラー
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error:  error.into(),
            detail: None,
        }
    }

    /// 詳細付きのエラー
    pub fn with_detail(error: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            error:  error.into(),
            detail: Some(detail.into()),
        }
    }

    /// 405 Method Not Allowed
    pub fn method_not_allowed() -> Self {
        Self::new("Method not allowed.")
    }
}
