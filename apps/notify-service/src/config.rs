//! # Notify Service 設定
//!
//! 環境変数から Notify Service サーバーの設定を読み込む。
//!
//! 外部サービスの接続情報は `PUSH_BACKEND` / `EMAIL_BACKEND` で選んだ
//! バックエンドに必要なものだけを必須とする。

use std::{env, path::PathBuf, str::FromStr};

use lightestate_infra::credential::CredentialSource;
use strum::{Display, EnumString};
use thiserror::Error;

/// 中継アドレスの既定値（Postmark の受信用アドレス）
pub const DEFAULT_RELAY_ADDRESS: &str = "d92b43c3f4789894b5f32edec838ccb9@inbound.postmarkapp.com";
/// 送信元アドレスの既定値
pub const DEFAULT_FROM_ADDRESS: &str = "Light Estate <contato@sprintcodes.com.br>";
/// サービスアカウントファイルの既定パス
pub const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "service-account.json";
/// 一斉配信の同時送信数の既定値
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 環境変数の値が不正
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// プッシュ送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PushBackend {
    /// FCM HTTP v1（サービスアカウント）
    FcmV1,
    /// FCM legacy（サーバーキー）
    FcmLegacy,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EmailBackend {
    Postmark,
    Noop,
}

/// Notify Service サーバーの設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host:     String,
    /// ポート番号
    pub port:     u16,
    /// Supabase 接続設定
    pub supabase: SupabaseConfig,
    /// プッシュ通知設定
    pub push:     PushConfig,
    /// メール設定
    pub email:    EmailConfig,
}

/// Supabase 接続設定
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url:         String,
    pub service_key: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

/// プッシュ通知設定
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub backend:       PushBackend,
    /// サービスアカウントの読み込み元（backend=fcm_v1 の場合に使用）
    pub credential:    CredentialSource,
    /// 事前発行済みアクセストークン（設定時はサービスアカウントより優先）
    pub access_token:  Option<String>,
    /// サーバーキー（backend=fcm_legacy の場合に必須）
    pub server_key:    Option<String>,
    /// 一斉配信の同時送信数
    pub max_in_flight: usize,
}

/// メール設定
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub backend:        EmailBackend,
    /// Postmark サーバートークン（backend=postmark の場合に必須）
    pub postmark_token: Option<String>,
    /// 送信元アドレス
    pub from_address:   String,
    /// 中継アドレス
    pub relay_address:  String,
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let push_backend = parse_or(get("PUSH_BACKEND"), "PUSH_BACKEND", PushBackend::Noop)?;
        let email_backend = parse_or(get("EMAIL_BACKEND"), "EMAIL_BACKEND", EmailBackend::Noop)?;

        let server_key = get("FCM_SERVER_KEY");
        if push_backend == PushBackend::FcmLegacy && server_key.is_none() {
            return Err(ConfigError::Missing("FCM_SERVER_KEY"));
        }
        let postmark_token = get("POSTMARK_TOKEN");
        if email_backend == EmailBackend::Postmark && postmark_token.is_none() {
            return Err(ConfigError::Missing("POSTMARK_TOKEN"));
        }

        let max_in_flight = parse_or(
            get("PUSH_MAX_IN_FLIGHT"),
            "PUSH_MAX_IN_FLIGHT",
            DEFAULT_MAX_IN_FLIGHT,
        )?;
        if max_in_flight == 0 {
            return Err(ConfigError::Invalid {
                name:  "PUSH_MAX_IN_FLIGHT",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 3000)?,
            supabase: SupabaseConfig {
                url:         require("SUPABASE_URL")?,
                service_key: require("SUPABASE_SERVICE_KEY")?,
            },
            push: PushConfig {
                backend: push_backend,
                credential: CredentialSource::select(
                    get("FIREBASE_ADMIN_JSON"),
                    get("FIREBASE_ADMIN_FILE")
                        .map_or_else(|| PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE), PathBuf::from),
                ),
                access_token: get("FCM_ACCESS_TOKEN"),
                server_key,
                max_in_flight,
            },
            email: EmailConfig {
                backend: email_backend,
                postmark_token,
                from_address: get("EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
                relay_address: get("RELAY_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_RELAY_ADDRESS.to_string()),
            },
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
