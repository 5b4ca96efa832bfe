//! # LED 表示ハンドラ
//!
//! 物件模型の LED パネルが、点灯すべき LED を取得するためのエンドポイント。
//!
//! ## エンドポイント
//!
//! - `GET /leds-status?buildingId={id}` - 販売済み住戸の LED インデックス一覧

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use lightestate_domain::{DomainError, led::LedIndex, sale::BuildingId};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::LedStatusUseCaseImpl};

/// LED 表示 API の共有状態
pub struct LedState {
    pub usecase: LedStatusUseCaseImpl,
}

/// クエリパラメータ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedStatusQuery {
    pub building_id: Option<String>,
}

/// LED 表示レスポンス
#[derive(Debug, Serialize)]
pub struct LedStatusResponse {
    pub leds: Vec<LedIndex>,
}

/// GET /leds-status
pub async fn led_status(
    State(state): State<Arc<LedState>>,
    Query(query): Query<LedStatusQuery>,
) -> Result<Json<LedStatusResponse>, ApiError> {
    let building_id = query
        .building_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| BuildingId::new(id.trim()))
        .ok_or_else(|| DomainError::missing_field("buildingId"))?;

    let leds = state.usecase.led_status(&building_id).await?;
    Ok(Json(LedStatusResponse { leds }))
}
