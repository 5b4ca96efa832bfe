//! # FCM アクセストークン
//!
//! FCM v1 API 用の OAuth2 アクセストークンを取得する。
//!
//! ## 実装
//!
//! - [`ServiceAccountTokenProvider`]: サービスアカウントの秘密鍵で RS256 JWT を署名し、
//!   `token_uri` で jwt-bearer グラントと交換する。取得したトークンは
//!   有効期限の 60 秒前までキャッシュする
//! - [`StaticTokenProvider`]: 事前に発行したトークン（`FCM_ACCESS_TOKEN`）を返す

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{credential::ServiceAccountKey, error::InfraError, response::ensure_success};

/// FCM 送信に必要な OAuth2 スコープ
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// アクセストークン取得トレイト
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// 有効なアクセストークンを返す
    async fn get_token(&self) -> Result<String, InfraError>;
}

/// 事前発行済みトークンを返すプロバイダ
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<String, InfraError> {
        if self.token.trim().is_empty() {
            return Err(InfraError::auth("アクセストークンが設定されていません"));
        }
        Ok(self.token.clone())
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss:   &'a str,
    scope: &'a str,
    aud:   &'a str,
    iat:   i64,
    exp:   i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in:   i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token:      String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// サービスアカウントからトークンを発行するプロバイダ
pub struct ServiceAccountTokenProvider {
    key:    ServiceAccountKey,
    client: reqwest::Client,
    cache:  Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            client: reqwest::Client::new(),
            cache: Mutex::new(None),
        }
    }

    /// サービスアカウントのプロジェクト ID
    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    /// jwt-bearer グラント用のアサーションを署名する
    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, InfraError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: FIREBASE_MESSAGING_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| InfraError::credential(format!("秘密鍵を読み込めません: {e}")))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| InfraError::credential(format!("JWT の署名に失敗: {e}")))
    }

    async fn fetch_token(&self, now: DateTime<Utc>) -> Result<CachedToken, InfraError> {
        let assertion = self.sign_assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| InfraError::auth(format!("トークンエンドポイントに接続できません: {e}")))?;
        let response = ensure_success("google-oauth", response)
            .await
            .map_err(|e| InfraError::auth(e.to_string()))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| InfraError::auth(format!("トークンレスポンスを解析できません: {e}")))?;

        Ok(CachedToken {
            token:      body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountTokenProvider {
    async fn get_token(&self) -> Result<String, InfraError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();

        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(now)) {
            return Ok(cached.token.clone());
        }

        let fresh = self.fetch_token(now).await?;
        tracing::debug!(expires_at = %fresh.expires_at, "FCM アクセストークンを更新");
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}
