//! # メール宛先ルール
//!
//! 販売登録メールの宛先を検証し、送信可能なメッセージを組み立てる。
//!
//! ## 中継アドレス
//!
//! Postmark の受信用アドレス（中継アドレス）宛てのメールは、受信 Webhook 経由で
//! プッシュ通知の一斉配信を起動するためのトリガーとして使う。実在の受信者ではない。
//!
//! - 中継アドレス **のみ** を宛先にした送信は、トリガーとして受け付ける
//! - 中継アドレスを他の宛先と混ぜた送信は拒否する（全員に通知が重複するため）
//!
//! [`EmailMessage`] は検証済みの [`Recipients`] からしか作れないため、
//! 未検証の宛先リストがトランスポートに渡ることはない。

use thiserror::Error;

use crate::push::NotificationPayload;

/// 中継メール由来の通知に使う既定のタイトル
const RELAY_DEFAULT_TITLE: &str = "New sale!";

/// 宛先検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    /// 宛先が 1 件も指定されていない
    #[error("No email addresses provided.")]
    NoRecipients,

    /// 中継アドレスが他の宛先と一緒に指定されている
    #[error(
        "You cannot send an email to the inbound relay address along with other recipients. \
         This causes duplicate notifications for everyone."
    )]
    RelayMixedWithOthers,

    /// 中継アドレスを除くと宛先が残らない
    #[error("No valid recipients to send email.")]
    NoValidRecipients,
}

/// 中継アドレス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAddress(String);

impl RelayAddress {
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(normalize(address.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 前後の空白と大文字小文字を無視して一致するか
    pub fn matches(&self, address: &str) -> bool {
        normalize(address) == self.0
    }
}

/// 検証済みの宛先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// 中継アドレスのみ（プッシュ一斉配信のトリガー）
    RelayTrigger(RelayAddress),
    /// 通常の宛先
    Direct(Vec<String>),
}

impl Recipients {
    /// 宛先リストを検証する
    pub fn resolve<S: AsRef<str>>(emails: &[S], relay: &RelayAddress) -> Result<Self, EmailError> {
        if emails.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        let has_relay = emails.iter().any(|e| relay.matches(e.as_ref()));
        if emails.len() > 1 && has_relay {
            return Err(EmailError::RelayMixedWithOthers);
        }
        if has_relay {
            return Ok(Self::RelayTrigger(relay.clone()));
        }

        let direct: Vec<String> = emails
            .iter()
            .map(|e| e.as_ref().trim())
            .filter(|e| !e.is_empty() && !relay.matches(e))
            .map(str::to_string)
            .collect();
        if direct.is_empty() {
            return Err(EmailError::NoValidRecipients);
        }

        Ok(Self::Direct(direct))
    }

    /// 送信 API に渡すアドレスの列
    pub fn addresses(&self) -> Vec<&str> {
        match self {
            Self::RelayTrigger(relay) => vec![relay.as_str()],
            Self::Direct(list) => list.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_relay_trigger(&self) -> bool {
        matches!(self, Self::RelayTrigger(_))
    }
}

/// 送信可能なメールメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from:       String,
    pub recipients: Recipients,
    pub subject:    String,
    pub text_body:  String,
}

impl EmailMessage {
    pub fn new(
        from: impl Into<String>,
        recipients: Recipients,
        subject: impl Into<String>,
        text_body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            recipients,
            subject: subject.into(),
            text_body: text_body.into(),
        }
    }

    /// 販売登録のお知らせメール
    pub fn sale_registered(from: impl Into<String>, recipients: Recipients, property: &str) -> Self {
        Self::new(
            from,
            recipients,
            format!("Sale registered: {property}"),
            format!("The property {property} has been marked as sold."),
        )
    }
}

/// Postmark の受信 Webhook で受け取ったメール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEmail {
    pub recipients: Vec<String>,
    pub subject:    String,
    pub text_body:  String,
}

impl InboundEmail {
    /// 宛先に中継アドレスが含まれるか
    pub fn is_addressed_to(&self, relay: &RelayAddress) -> bool {
        self.recipients.iter().any(|r| relay.matches(r))
    }

    /// 一斉配信するプッシュ通知に変換する
    ///
    /// 件名が空なら既定のタイトル、本文が空なら件名を本文に使う。
    pub fn push_payload(&self) -> NotificationPayload {
        let subject = self.subject.trim();
        let title = if subject.is_empty() {
            RELAY_DEFAULT_TITLE
        } else {
            subject
        };
        let body = match self.text_body.trim() {
            "" => title,
            body => body,
        };

        NotificationPayload::new(title, body)
            .with_data("source", "email-relay")
            .with_data("subject", subject)
    }
}

fn normalize(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const RELAY: &str = "relay@inbound.postmarkapp.com";

    fn relay() -> RelayAddress {
        RelayAddress::new(RELAY)
    }

    #[test]
    fn test_空の宛先はエラー() {
        let emails: [&str; 0] = [];
        assert_eq!(
            Recipients::resolve(&emails, &relay()),
            Err(EmailError::NoRecipients)
        );
    }

    #[test]
    fn test_中継アドレスと他の宛先の混在は拒否する() {
        let emails = ["ana@example.com", " RELAY@inbound.postmarkapp.com "];
        assert_eq!(
            Recipients::resolve(&emails, &relay()),
            Err(EmailError::RelayMixedWithOthers)
        );
    }

    #[test]
    fn test_中継アドレスのみはトリガーとして受け付ける() {
        let emails = ["Relay@Inbound.Postmarkapp.com"];
        let recipients = Recipients::resolve(&emails, &relay()).unwrap();

        assert!(recipients.is_relay_trigger());
        assert_eq!(recipients.addresses(), vec![RELAY]);
    }

    #[test]
    fn test_通常の宛先はトリムして受け付ける() {
        let emails = [" ana@example.com", "bruno@example.com "];
        let recipients = Recipients::resolve(&emails, &relay()).unwrap();

        assert_eq!(
            recipients,
            Recipients::Direct(vec![
                "ana@example.com".to_string(),
                "bruno@example.com".to_string(),
            ])
        );
    }

    #[test]
    fn test_空白のみの宛先は有効な宛先なしとして拒否する() {
        let emails = ["   "];
        assert_eq!(
            Recipients::resolve(&emails, &relay()),
            Err(EmailError::NoValidRecipients)
        );
    }

    #[test]
    fn test_sale_registeredの件名と本文() {
        let recipients = Recipients::Direct(vec!["ana@example.com".to_string()]);
        let message = EmailMessage::sale_registered("noreply@example.com", recipients, "Torre Sul");

        assert_eq!(message.subject, "Sale registered: Torre Sul");
        assert_eq!(
            message.text_body,
            "The property Torre Sul has been marked as sold."
        );
    }

    #[test]
    fn test_宛先に中継アドレスを含む受信メールを判定する() {
        let inbound = InboundEmail {
            recipients: vec![
                "ana@example.com".to_string(),
                "Relay@Inbound.Postmarkapp.com".to_string(),
            ],
            subject:    "Venda".to_string(),
            text_body:  String::new(),
        };
        assert!(inbound.is_addressed_to(&relay()));

        let other = InboundEmail {
            recipients: vec!["ana@example.com".to_string()],
            ..inbound
        };
        assert!(!other.is_addressed_to(&relay()));
    }

    #[test]
    fn test_受信メールのプッシュ通知変換() {
        let inbound = InboundEmail {
            recipients: vec![RELAY.to_string()],
            subject:    " Sale registered: Torre Sul ".to_string(),
            text_body:  "The property Torre Sul has been marked as sold.\n".to_string(),
        };

        let payload = inbound.push_payload();

        assert_eq!(payload.title, "Sale registered: Torre Sul");
        assert_eq!(payload.body, "The property Torre Sul has been marked as sold.");
        assert_eq!(
            payload.data.get("source").map(String::as_str),
            Some("email-relay")
        );
    }

    #[test]
    fn test_件名と本文が空の受信メールは既定タイトルを使う() {
        let inbound = InboundEmail {
            recipients: vec![RELAY.to_string()],
            subject:    "  ".to_string(),
            text_body:  String::new(),
        };

        let payload = inbound.push_payload();

        assert_eq!(payload.title, "New sale!");
        assert_eq!(payload.body, "New sale!");
    }
}
