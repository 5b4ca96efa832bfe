//! # Notify Service エラー定義
//!
//! ユースケースで発生するエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | エラー種別 | HTTP ステータス | レスポンス |
//! |-----------|----------------|-----------|
//! | `Validation` | 400 | `{error}` |
//! | `NotFound` | 404 | `{error}` |
//! | `Upstream` | 500 | `{error, detail}`（外部サービスの応答を含む） |
//! | `Auth` | 500 | `{error}`（認証情報の詳細は返さない） |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lightestate_domain::{DomainError, email::EmailError, push::PushError};
use lightestate_infra::InfraError;
use lightestate_shared::{ErrorResponse, event_log::error};
use thiserror::Error;

/// Notify Service で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// 不正なリクエスト
    #[error("{0}")]
    Validation(String),

    /// リソースが見つからない
    #[error("{0}")]
    NotFound(String),

    /// 外部サービス（Supabase / Postmark 等）の呼び出しに失敗
    #[error("{message}: {source}")]
    Upstream {
        /// 利用者に返すメッセージ
        message: &'static str,
        #[source]
        source:  InfraError,
    },

    /// 認証情報・アクセストークンの取得に失敗
    #[error("{message}: {reason}")]
    Auth {
        /// 利用者に返すメッセージ
        message: &'static str,
        /// ログにのみ出力する原因
        reason:  String,
    },
}

impl ApiError {
    /// インフラ層エラーを変換する
    ///
    /// 認証関連のエラーは詳細を返さない `Auth` に振り分ける。
    pub fn upstream(message: &'static str, source: InfraError) -> Self {
        if source.is_auth() {
            Self::Auth {
                message,
                reason: source.to_string(),
            }
        } else {
            Self::Upstream { message, source }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_) => Self::Validation(err.to_string()),
            DomainError::NotFound { .. } => Self::NotFound(err.to_string()),
        }
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PushError> for ApiError {
    fn from(err: PushError) -> Self {
        match err {
            PushError::TransportUnavailable(reason) => Self::Auth {
                message: "Error sending push notification.",
                reason,
            },
        }
    }
}

impl ApiError {
    /// HTTP ステータスコード
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Auth { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 利用者に返すメッセージ
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Upstream { message, .. } | Self::Auth { message, .. } => (*message).to_string(),
        }
    }

    /// サーバー側の失敗をログに出力する
    ///
    /// クライアント起因のエラー（400 / 404）は出力しない。
    pub fn log(&self) {
        match self {
            Self::Validation(_) | Self::NotFound(_) => {}
            Self::Upstream { message, source } => tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error = %source,
                span_trace = %source.span_trace(),
                "{message}"
            ),
            Self::Auth { message, reason } => tracing::error!(
                error.category = error::category::CREDENTIAL,
                error.kind = error::kind::ACCESS_TOKEN,
                reason = %reason,
                "{message}"
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = match self {
            Self::Upstream { message, source } => match source.detail() {
                Some(detail) => ErrorResponse::with_detail(message, detail),
                None => ErrorResponse::new(message),
            },
            other => ErrorResponse::new(other.public_message()),
        };

        (status, Json(body)).into_response()
    }
}
