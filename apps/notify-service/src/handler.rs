//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケースに委譲
//! - リクエストボディの解析失敗もエンドポイントごとの JSON 形式で 400 を返す

pub mod health;
pub mod leds_status;
pub mod notify_sale;
pub mod push_token;
pub mod send_email;
pub mod webhook;

use axum::{Json, http::StatusCode};
pub use health::health_check;
pub use leds_status::{LedState, led_status};
use lightestate_shared::ErrorResponse;
pub use notify_sale::{SaleState, notify_sale};
pub use push_token::{PushTokenState, register_push_token};
pub use send_email::{EmailState, send_email};
pub use webhook::{RelayState, webhook, webhook_method_not_allowed};

/// OPTIONS リクエストには空の 200 を返す
///
/// CORS プリフライト（`Origin` 付き）は `CorsLayer` が先に応答する。
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// ルートが対応していないメソッド
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::method_not_allowed()),
    )
}

/// 存在しないパス
pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found.")))
}
