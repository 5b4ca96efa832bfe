//! 中継メールからのプッシュ配信ユースケース
//!
//! 中継アドレス宛てのメールを Postmark が受信すると Webhook が呼ばれる。
//! 受信メールの件名・本文を通知内容として、登録済みの全配信先へ一斉配信する。

use std::sync::Arc;

use lightestate_domain::{
    email::{InboundEmail, RelayAddress},
    push::{FanoutResult, PushAudience},
};
use lightestate_infra::repository::TokenStore;
use lightestate_shared::{event_log::event, log_business_event};

use super::{PushFanoutDispatcher, resolve_targets};
use crate::error::ApiError;

/// 中継メールユースケース
pub struct InboundRelayUseCaseImpl {
    relay:       RelayAddress,
    token_store: Arc<dyn TokenStore>,
    dispatcher:  Arc<PushFanoutDispatcher>,
}

impl InboundRelayUseCaseImpl {
    pub fn new(
        relay: RelayAddress,
        token_store: Arc<dyn TokenStore>,
        dispatcher: Arc<PushFanoutDispatcher>,
    ) -> Self {
        Self {
            relay,
            token_store,
            dispatcher,
        }
    }

    /// 受信メールを一斉配信に中継する
    ///
    /// 中継アドレス宛てでないメールは配信せずに拒否する。
    pub async fn relay(&self, inbound: &InboundEmail) -> Result<FanoutResult, ApiError> {
        if !inbound.is_addressed_to(&self.relay) {
            return Err(ApiError::Validation(
                "Email was not addressed to the relay address.".to_string(),
            ));
        }

        log_business_event!(
            event.category = event::category::EMAIL,
            event.action = event::action::RELAY_RECEIVED,
            event.result = event::result::SUCCESS,
            email.subject = %inbound.subject,
            "中継メールを受信"
        );

        let targets = resolve_targets(self.token_store.as_ref(), &PushAudience::All).await?;
        Ok(self
            .dispatcher
            .dispatch(&targets, &inbound.push_payload())
            .await?)
    }
}
