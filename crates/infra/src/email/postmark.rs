//! Postmark メール送信実装
//!
//! Postmark の `/email` API にテキストメールを送信する。

use async_trait::async_trait;
use lightestate_domain::email::EmailMessage;
use serde::Serialize;

use super::EmailTransport;
use crate::{error::InfraError, response::ensure_success};

const POSTMARK_ENDPOINT: &str = "https://api.postmarkapp.com/email";
const MESSAGE_STREAM: &str = "outbound";

/// Postmark メール送信
pub struct PostmarkEmailTransport {
    server_token: String,
    client:       reqwest::Client,
}

impl PostmarkEmailTransport {
    /// 新しい Postmark 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `server_token`: Postmark のサーバー API トークン
    pub fn new(server_token: impl Into<String>) -> Self {
        Self {
            server_token: server_token.into(),
            client:       reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkRequest<'a> {
    from:           &'a str,
    to:             String,
    subject:        &'a str,
    text_body:      &'a str,
    message_stream: &'a str,
}

impl<'a> From<&'a EmailMessage> for PostmarkRequest<'a> {
    fn from(email: &'a EmailMessage) -> Self {
        Self {
            from:           &email.from,
            to:             email.recipients.addresses().join(","),
            subject:        &email.subject,
            text_body:      &email.text_body,
            message_stream: MESSAGE_STREAM,
        }
    }
}

#[async_trait]
impl EmailTransport for PostmarkEmailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<(), InfraError> {
        let request = PostmarkRequest::from(email);

        let response = self
            .client
            .post(POSTMARK_ENDPOINT)
            .header("X-Postmark-Server-Token", &self.server_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;
        ensure_success("postmark", response).await?;

        tracing::info!(
            to = %request.to,
            subject = %email.subject,
            "Postmark でメール送信完了"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lightestate_domain::email::{Recipients, RelayAddress};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_リクエストボディの形状() {
        let relay = RelayAddress::new("relay@inbound.postmarkapp.com");
        let recipients =
            Recipients::resolve(&["ana@example.com", "bia@example.com"], &relay).unwrap();
        let email = EmailMessage::sale_registered(
            "Light Estate <contato@sprintcodes.com.br>",
            recipients,
            "Torre Sul 203",
        );

        let body = serde_json::to_value(PostmarkRequest::from(&email)).unwrap();

        assert_eq!(
            body,
            json!({
                "From": "Light Estate <contato@sprintcodes.com.br>",
                "To": "ana@example.com,bia@example.com",
                "Subject": "Sale registered: Torre Sul 203",
                "TextBody": "The property Torre Sul 203 has been marked as sold.",
                "MessageStream": "outbound"
            })
        );
    }
}
