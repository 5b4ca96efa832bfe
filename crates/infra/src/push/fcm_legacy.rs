//! FCM legacy HTTP API 実装
//!
//! サーバーキー（`Authorization: key=...`）で `/fcm/send` を呼び出す。
//! HTTP 200 でも `results[0].error` に配信先ごとのエラーが入る。

use async_trait::async_trait;
use lightestate_domain::push::{NotificationPayload, PushSendError, PushToken};
use serde::Deserialize;
use serde_json::json;

use super::{PushTransport, network_error};

const FCM_LEGACY_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

/// トークンが恒久的に無効であることを示すエラー
const PERMANENT_ERRORS: [&str; 2] = ["NotRegistered", "InvalidRegistration"];

/// FCM legacy 送信
pub struct FcmLegacyTransport {
    server_key: String,
    client:     reqwest::Client,
}

impl FcmLegacyTransport {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            server_key: server_key.into(),
            client:     reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct LegacyResponse {
    #[serde(default)]
    results: Vec<LegacyResult>,
}

#[derive(Deserialize)]
struct LegacyResult {
    error: Option<String>,
}

/// HTTP 200 のレスポンスボディから配信結果を判定する
pub(crate) fn classify_legacy_response(body: &str) -> Result<(), PushSendError> {
    let parsed: LegacyResponse = serde_json::from_str(body)
        .map_err(|e| PushSendError::transient("INVALID_RESPONSE", e.to_string()))?;

    match parsed.results.into_iter().next().and_then(|r| r.error) {
        None => Ok(()),
        Some(code) if PERMANENT_ERRORS.contains(&code.as_str()) => {
            Err(PushSendError::permanent(code.clone(), code))
        }
        Some(code) => Err(PushSendError::transient(code.clone(), code)),
    }
}

#[async_trait]
impl PushTransport for FcmLegacyTransport {
    async fn send(
        &self,
        token: &PushToken,
        payload: &NotificationPayload,
    ) -> Result<(), PushSendError> {
        let request = json!({
            "to": token.as_str(),
            "data": payload.to_data_message(),
        });

        let response = self
            .client
            .post(FCM_LEGACY_ENDPOINT)
            .header(reqwest::header::AUTHORIZATION, format!("key={}", self.server_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network_error(&e))?;
        if !status.is_success() {
            return Err(PushSendError::transient(
                format!("HTTP_{}", status.as_u16()),
                body,
            ));
        }

        classify_legacy_response(&body)
    }
}
