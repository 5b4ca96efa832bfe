//! 販売通知のプッシュ配信ユースケース

use std::sync::Arc;

use lightestate_domain::{
    push::{FanoutResult, PushAudience},
    sale::SaleAnnouncement,
};
use lightestate_infra::repository::TokenStore;

use super::{PushFanoutDispatcher, resolve_targets};
use crate::error::ApiError;

/// 販売通知の結果
#[derive(Debug, PartialEq, Eq)]
pub enum SaleNotification {
    /// 配信先が登録されていない
    NoTargets,
    /// 一斉配信を実行した
    Dispatched(FanoutResult),
}

/// 販売通知ユースケース
pub struct SaleNotificationUseCaseImpl {
    token_store: Arc<dyn TokenStore>,
    dispatcher:  Arc<PushFanoutDispatcher>,
}

impl SaleNotificationUseCaseImpl {
    pub fn new(token_store: Arc<dyn TokenStore>, dispatcher: Arc<PushFanoutDispatcher>) -> Self {
        Self {
            token_store,
            dispatcher,
        }
    }

    /// 販売を宛先範囲の配信先へ通知する
    pub async fn notify_sale(
        &self,
        announcement: &SaleAnnouncement,
        audience: &PushAudience,
    ) -> Result<SaleNotification, ApiError> {
        let targets = resolve_targets(self.token_store.as_ref(), audience).await?;
        if targets.is_empty() {
            tracing::info!(audience = ?audience, "配信先が登録されていないため通知をスキップ");
            return Ok(SaleNotification::NoTargets);
        }

        let result = self
            .dispatcher
            .dispatch(&targets, &announcement.push_payload())
            .await?;
        Ok(SaleNotification::Dispatched(result))
    }
}
