//! # インフラ層エラー定義
//!
//! 外部サービス（Supabase、FCM、Postmark）との通信や認証情報の読み込みで
//! 発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Http, Upstream, Credential 等）
//!
//! `From` 実装や convenience constructor でエラーを生成すると、
//! その時点のスパン情報が自動的にキャプチャされる。

use std::fmt;

use derive_more::Display;
use serde_json::Value;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::Auth(_) => { /* 認証情報の問題 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// HTTP 通信エラー
    ///
    /// 接続失敗、タイムアウト、レスポンスボディの読み込み失敗など。
    #[error("HTTP 通信エラー: {0}")]
    Http(#[source] reqwest::Error),

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 外部サービスが失敗ステータスを返した
    #[error("{service} がエラーを返しました (status={status}): {body}")]
    Upstream {
        /// サービス名（例: "supabase", "postmark"）
        service: &'static str,
        /// HTTP ステータスコード
        status:  u16,
        /// レスポンスボディ
        body:    String,
    },

    /// 認証情報（サービスアカウント）の読み込み・解析に失敗
    #[error("認証情報エラー: {0}")]
    Credential(String),

    /// アクセストークンの取得に失敗
    #[error("アクセストークンの取得に失敗: {0}")]
    Auth(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 認証情報・アクセストークンに起因するエラーか
    ///
    /// このエラーを利用者に返す場合は、詳細を含めずメッセージのみとする。
    pub fn is_auth(&self) -> bool {
        matches!(
            self.kind,
            InfraErrorKind::Credential(_) | InfraErrorKind::Auth(_)
        )
    }

    /// 利用者に返してよい詳細情報
    ///
    /// 外部サービスのレスポンスボディ（JSON として解釈できればそのまま）や
    /// 通信エラーのメッセージを返す。認証関連のエラーでは `None`。
    pub fn detail(&self) -> Option<Value> {
        match &self.kind {
            InfraErrorKind::Upstream { body, .. } => Some(
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone())),
            ),
            InfraErrorKind::Http(e) => Some(Value::String(e.to_string())),
            InfraErrorKind::Serialization(e) => Some(Value::String(e.to_string())),
            InfraErrorKind::Credential(_) | InfraErrorKind::Auth(_) => None,
        }
    }

    // ===== Convenience constructors =====

    fn from_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    /// 外部サービスの失敗ステータスからエラーを生成する
    pub fn upstream(service: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Upstream {
            service,
            status,
            body: body.into(),
        })
    }

    /// 認証情報エラーを生成する
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Credential(msg.into()))
    }

    /// アクセストークン取得エラーを生成する
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Auth(msg.into()))
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<reqwest::Error> for InfraError {
    fn from(source: reqwest::Error) -> Self {
        Self::from_kind(InfraErrorKind::Http(source))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::from_kind(InfraErrorKind::Serialization(source))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    /// テスト用に ErrorLayer 付き subscriber を設定する
    fn with_error_layer(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        f();
    }

    #[test]
    fn test_from_serde_json_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_supabase_rows");
            let _enter = span.enter();

            let json_err = serde_json::from_str::<Vec<Value>>("invalid").unwrap_err();
            let err: InfraError = json_err.into();

            assert!(matches!(err.kind(), InfraErrorKind::Serialization(_)));
            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("test_supabase_rows"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    #[test]
    fn test_upstreamでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_postmark");
            let _enter = span.enter();

            let err = InfraError::upstream("postmark", 422, "{}");

            let trace_str = format!("{}", err.span_trace());
            assert!(trace_str.contains("test_postmark"));
        });
    }

    #[test]
    fn test_upstreamのdetailはjsonボディをそのまま返す() {
        let err = InfraError::upstream(
            "supabase",
            401,
            r#"{"code":"PGRST301","message":"JWT expired"}"#,
        );

        assert_eq!(
            err.detail(),
            Some(serde_json::json!({"code": "PGRST301", "message": "JWT expired"}))
        );
    }

    #[test]
    fn test_upstreamのdetailは非jsonボディを文字列で返す() {
        let err = InfraError::upstream("fcm", 502, "Bad Gateway");
        assert_eq!(err.detail(), Some(Value::String("Bad Gateway".to_string())));
    }

    #[test]
    fn test_認証関連エラーはdetailを返さない() {
        let err = InfraError::credential("private_key がありません");
        assert!(err.is_auth());
        assert!(err.detail().is_none());

        let err = InfraError::auth("invalid_grant");
        assert!(err.is_auth());
        assert!(err.detail().is_none());
    }

    #[test]
    fn test_displayがinfra_error_kindのメッセージを出力する() {
        let err = InfraError::upstream("postmark", 422, "Invalid 'To' address.");
        assert_eq!(
            format!("{err}"),
            "postmark がエラーを返しました (status=422): Invalid 'To' address."
        );
    }

    #[test]
    fn test_sourceがinfra_error_kindに委譲する() {
        use std::error::Error;

        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: InfraError = json_err.into();

        assert!(err.source().is_some());
    }
}
