//! # SupabaseTokenStore
//!
//! `push_tokens` テーブルに保存された端末の登録トークンを扱う。

use async_trait::async_trait;
use lightestate_domain::push::{PushTarget, PushToken};
use serde::Serialize;
use serde_json::Value;

use super::TokenStore;
use crate::{
    error::InfraError,
    supabase::{SupabaseClient, eq},
};

const TABLE: &str = "push_tokens";
const COLUMNS: &str = "token,email";

/// Supabase 実装の TokenStore
#[derive(Clone)]
pub struct SupabaseTokenStore {
    client: SupabaseClient,
}

impl SupabaseTokenStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct TokenRow<'a> {
    token: &'a str,
    email: Option<&'a str>,
}

/// トークン行を配信先に変換する
///
/// トークンが null・空文字列の行は配信できないため除外する。
fn parse_targets(rows: &[Value]) -> Vec<PushTarget> {
    rows.iter()
        .filter_map(|row| {
            let token = row.get("token")?.as_str()?.trim();
            if token.is_empty() {
                return None;
            }
            let target = PushTarget::new(token);
            Some(match row.get("email").and_then(Value::as_str) {
                Some(email) if !email.trim().is_empty() => target.owned_by(email.trim()),
                _ => target,
            })
        })
        .collect()
}

#[async_trait]
impl TokenStore for SupabaseTokenStore {
    async fn list_all(&self) -> Result<Vec<PushTarget>, InfraError> {
        let rows = self
            .client
            .select(TABLE, &[("select", COLUMNS.to_string())])
            .await?;
        Ok(parse_targets(&rows))
    }

    async fn find_by_owner(&self, email: &str) -> Result<Vec<PushTarget>, InfraError> {
        let rows = self
            .client
            .select(
                TABLE,
                &[("select", COLUMNS.to_string()), ("email", eq(email))],
            )
            .await?;
        Ok(parse_targets(&rows))
    }

    async fn register(&self, target: &PushTarget) -> Result<(), InfraError> {
        let row = TokenRow {
            token: target.token.as_str(),
            email: target.owner_email.as_deref(),
        };
        self.client.upsert(TABLE, "token", &row).await
    }

    async fn remove(&self, token: &PushToken) -> Result<(), InfraError> {
        self.client.delete(TABLE, &[("token", eq(token))]).await
    }
}
