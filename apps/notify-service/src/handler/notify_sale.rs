//! # 販売通知ハンドラ
//!
//! 営業担当者が販売を登録したときに呼ばれ、登録済みの端末へプッシュ通知を送る。
//!
//! ## エンドポイント
//!
//! - `POST /notify-sale` - 販売通知の一斉配信
//!
//! ## レスポンス例
//!
//! ```json
//! { "success": true, "sent": 2, "failed": 1, "results": [ ... ] }
//! ```
//!
//! 配信先が 1 件もない場合は `{ "success": true, "warnings": "No registered tokens." }`。

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use lightestate_domain::{
    push::{DeliveryOutcome, PushAudience},
    sale::SaleAnnouncement,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ApiError,
    usecase::{SaleNotification, SaleNotificationUseCaseImpl},
};

/// 販売通知 API の共有状態
pub struct SaleState {
    pub usecase: SaleNotificationUseCaseImpl,
}

/// 販売通知リクエスト
///
/// 住戸番号や階は数値・文字列のどちらでも受け付ける。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifySaleRequest {
    pub property:         Option<Value>,
    pub apartment_number: Option<Value>,
    pub floor:            Option<Value>,
    pub user:             Option<Value>,
    pub date:             Option<Value>,
    /// 指定時はこのメールアドレスが所有する配信先にだけ通知する
    pub owner_email:      Option<String>,
}

/// 販売通知レスポンス
#[derive(Debug, Serialize)]
pub struct NotifySaleResponse {
    pub success:  bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent:     Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed:   Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results:  Option<Vec<DeliveryOutcome>>,
}

/// JSON 値を通知用の文字列にする（null・欠落は空文字列）
fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// POST /notify-sale
pub async fn notify_sale(
    State(state): State<Arc<SaleState>>,
    body: Result<Json<NotifySaleRequest>, JsonRejection>,
) -> Result<Json<NotifySaleResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    let announcement = SaleAnnouncement::new(
        field_text(req.property.as_ref()),
        field_text(req.apartment_number.as_ref()),
        field_text(req.floor.as_ref()),
        field_text(req.user.as_ref()),
        field_text(req.date.as_ref()),
    )?;
    let audience = PushAudience::from_owner(req.owner_email.as_deref());

    let response = match state.usecase.notify_sale(&announcement, &audience).await? {
        SaleNotification::NoTargets => NotifySaleResponse {
            success:  true,
            warnings: Some("No registered tokens.".to_string()),
            sent:     None,
            failed:   None,
            results:  None,
        },
        SaleNotification::Dispatched(result) => NotifySaleResponse {
            success:  true,
            warnings: None,
            sent:     Some(result.sent_count),
            failed:   Some(result.failed_count),
            results:  Some(result.outcomes),
        },
    };
    Ok(Json(response))
}
