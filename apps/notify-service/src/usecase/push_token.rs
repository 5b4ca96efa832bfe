//! 配信先トークンの登録ユースケース

use std::sync::Arc;

use lightestate_domain::{DomainError, push::PushTarget};
use lightestate_infra::repository::TokenStore;
use lightestate_shared::{event_log::event, log_business_event};

use crate::error::ApiError;

/// 配信先登録ユースケース
pub struct PushTokenUseCaseImpl {
    token_store: Arc<dyn TokenStore>,
}

impl PushTokenUseCaseImpl {
    pub fn new(token_store: Arc<dyn TokenStore>) -> Self {
        Self { token_store }
    }

    /// 端末の登録トークンを保存する
    ///
    /// 同じトークンが登録済みの場合は所有者のメールアドレスを更新する。
    pub async fn register(&self, token: &str, owner_email: Option<&str>) -> Result<(), ApiError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::missing_field("token").into());
        }

        let target = match owner_email.map(str::trim) {
            Some(email) if !email.is_empty() => PushTarget::new(token).owned_by(email),
            _ => PushTarget::new(token),
        };
        self.token_store
            .register(&target)
            .await
            .map_err(|e| ApiError::upstream("Supabase error", e))?;

        log_business_event!(
            event.category = event::category::PUSH,
            event.action = event::action::PUSH_TOKEN_REGISTERED,
            event.result = event::result::SUCCESS,
            push.has_owner = target.owner_email.is_some(),
            "配信先トークンを登録"
        );
        Ok(())
    }
}
