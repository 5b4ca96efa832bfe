//! 販売済み住戸の LED 表示ユースケース

use std::sync::Arc;

use lightestate_domain::{
    DomainError,
    led::{self, LedIndex},
    sale::BuildingId,
};
use lightestate_infra::repository::SalesRepository;
use lightestate_shared::{event_log::event, log_business_event};

use crate::error::ApiError;

/// LED 表示ユースケース
pub struct LedStatusUseCaseImpl {
    sales_repository: Arc<dyn SalesRepository>,
}

impl LedStatusUseCaseImpl {
    pub fn new(sales_repository: Arc<dyn SalesRepository>) -> Self {
        Self { sales_repository }
    }

    /// 建物の販売済み住戸を点灯すべき LED インデックスに変換する
    ///
    /// 1. 建物の LED 構成を取得（存在しなければ NotFound）
    /// 2. 販売済み住戸を取得
    /// 3. 住戸番号を LED インデックスに変換（範囲外は除外）
    pub async fn led_status(&self, building_id: &BuildingId) -> Result<Vec<LedIndex>, ApiError> {
        let config = self
            .sales_repository
            .get_building_config(building_id)
            .await
            .map_err(|e| ApiError::upstream("Supabase error", e))?
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "Building",
                id:          building_id.to_string(),
            })?;

        let sales = self
            .sales_repository
            .list_sales(building_id)
            .await
            .map_err(|e| ApiError::upstream("Supabase error", e))?;

        let leds = led::map_sales(&sales, &config);
        log_business_event!(
            event.category = event::category::LED,
            event.action = event::action::LED_STATUS_SERVED,
            event.result = event::result::SUCCESS,
            led.building_id = %building_id,
            led.sales = sales.len(),
            led.lit = leds.len(),
            "LED 表示を返却"
        );
        Ok(leds)
    }
}
