//! 販売登録メールの送信ユースケース

use std::sync::Arc;

use lightestate_domain::{
    DomainError,
    email::{EmailMessage, Recipients, RelayAddress},
};
use lightestate_infra::email::EmailTransport;
use lightestate_shared::{event_log::event, log_business_event};

use crate::error::ApiError;

/// メール送信ユースケース
pub struct EmailUseCaseImpl {
    transport:    Arc<dyn EmailTransport>,
    from_address: String,
    relay:        RelayAddress,
}

impl EmailUseCaseImpl {
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        from_address: impl Into<String>,
        relay: RelayAddress,
    ) -> Self {
        Self {
            transport,
            from_address: from_address.into(),
            relay,
        }
    }

    /// 販売登録のお知らせメールを送信する
    ///
    /// 宛先は中継アドレスのルールで検証し、違反していれば送信手段を呼ばずに拒否する。
    pub async fn send_sale_email(&self, property: &str, emails: &[String]) -> Result<(), ApiError> {
        let recipients = Recipients::resolve(emails, &self.relay)?;
        let property = property.trim();
        if property.is_empty() {
            return Err(DomainError::missing_field("property").into());
        }

        let relay_trigger = recipients.is_relay_trigger();
        let message = EmailMessage::sale_registered(&self.from_address, recipients, property);

        match self.transport.send(&message).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_SENT,
                    event.result = event::result::SUCCESS,
                    email.recipients = message.recipients.addresses().len(),
                    email.relay_trigger = relay_trigger,
                    "販売登録メール送信成功"
                );
                Ok(())
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_FAILED,
                    event.result = event::result::FAILURE,
                    email.relay_trigger = relay_trigger,
                    error = %e,
                    "販売登録メール送信失敗"
                );
                Err(ApiError::upstream("Failed to send email.", e))
            }
        }
    }
}
