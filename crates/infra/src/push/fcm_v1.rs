//! FCM HTTP v1 API 実装
//!
//! `projects/{project_id}/messages:send` に data-only メッセージを送る。
//! Web クライアントがバックグラウンドで表示を組み立てるため、
//! `notification` ブロックは使わず `title` / `body` を `data` に含める。

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use lightestate_domain::push::{NotificationPayload, PushSendError, PushToken};
use serde::{Deserialize, Serialize};

use super::{AUTH_ERROR, PushTransport, network_error};
use crate::{access_token::AccessTokenProvider, error::InfraError};

const FCM_ENDPOINT: &str = "https://fcm.googleapis.com";
const FCM_ERROR_TYPE: &str = "type.googleapis.com/google.firebase.fcm.v1.FcmError";
const UNREGISTERED: &str = "UNREGISTERED";
const NOT_FOUND: &str = "NOT_FOUND";

/// FCM HTTP v1 送信
pub struct FcmV1Transport {
    project_id: String,
    tokens:     Arc<dyn AccessTokenProvider>,
    client:     reqwest::Client,
}

impl FcmV1Transport {
    pub fn new(project_id: impl Into<String>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            project_id: project_id.into(),
            tokens,
            client: reqwest::Client::new(),
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{FCM_ENDPOINT}/v1/projects/{}/messages:send",
            self.project_id
        )
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: Message<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
    token: &'a str,
    data:  BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    status:  Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "@type")]
    type_url:   Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// 失敗レスポンスを送信エラーに分類する
///
/// エラーコードは `FcmError` 詳細の `errorCode`、なければ `status`、
/// それもなければ `HTTP_{status}` とする。`UNREGISTERED` と
/// 404 `NOT_FOUND` はトークンが恒久的に無効であることを示す。
pub(crate) fn classify_v1_error(status: u16, body: &str) -> PushSendError {
    let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) else {
        return PushSendError::transient(format!("HTTP_{status}"), body);
    };
    let error = parsed.error;

    let fcm_code = error
        .details
        .iter()
        .filter(|d| d.type_url.as_deref() == Some(FCM_ERROR_TYPE))
        .find_map(|d| d.error_code.clone());
    let not_found = status == 404 && error.status.as_deref() == Some(NOT_FOUND);

    let error_code = fcm_code
        .or(error.status)
        .unwrap_or_else(|| format!("HTTP_{status}"));

    if error_code == UNREGISTERED || not_found {
        PushSendError::permanent(error_code, error.message)
    } else {
        PushSendError::transient(error_code, error.message)
    }
}

#[async_trait]
impl PushTransport for FcmV1Transport {
    async fn prepare(&self) -> Result<(), InfraError> {
        self.tokens.get_token().await.map(|_| ())
    }

    async fn send(
        &self,
        token: &PushToken,
        payload: &NotificationPayload,
    ) -> Result<(), PushSendError> {
        let access_token = self
            .tokens
            .get_token()
            .await
            .map_err(|e| PushSendError::transient(AUTH_ERROR, e.to_string()))?;

        let request = SendRequest {
            message: Message {
                token: token.as_str(),
                data:  payload.to_data_message(),
            },
        };

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.map_err(|e| network_error(&e))?;
        Err(classify_v1_error(status.as_u16(), &body))
    }
}
