//! # Supabase REST クライアント
//!
//! Supabase の PostgREST エンドポイント（`/rest/v1/{table}`）を呼び出す薄いクライアント。
//!
//! サービスキーを `apikey` ヘッダーと `Authorization: Bearer` の両方に設定する。
//! フィルタは PostgREST のクエリ構文（`column=eq.value`）で渡す。

use serde::Serialize;
use serde_json::Value;

use crate::{error::InfraError, response::ensure_success};

const SERVICE: &str = "supabase";

/// PostgREST の等価フィルタ値を作る
pub(crate) fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Supabase REST クライアント
#[derive(Clone)]
pub struct SupabaseClient {
    base_url:    String,
    service_key: String,
    client:      reqwest::Client,
}

impl SupabaseClient {
    /// 新しいクライアントを作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: プロジェクト URL（例: `https://xyzcompany.supabase.co`）
    /// - `service_key`: service_role キー
    pub fn new(base_url: &str, service_key: impl Into<String>) -> Self {
        Self {
            base_url:    base_url.trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            client:      reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// 行を取得する
    ///
    /// `query` には `select` とフィルタを PostgREST 構文で渡す。
    #[tracing::instrument(skip(self, query), level = "debug")]
    pub async fn select(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, InfraError> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(query)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// 行を挿入する（`on_conflict` 列が重複する場合は更新）
    #[tracing::instrument(skip(self, row), level = "debug")]
    pub async fn upsert<T: Serialize + Sync + ?Sized>(
        &self,
        table: &str,
        on_conflict: &str,
        row: &T,
    ) -> Result<(), InfraError> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    /// フィルタに一致する行を削除する
    #[tracing::instrument(skip(self, filter), level = "debug")]
    pub async fn delete(&self, table: &str, filter: &[(&str, String)]) -> Result<(), InfraError> {
        let response = self
            .authorized(self.client.delete(self.table_url(table)))
            .query(filter)
            .header("Prefer", "return=minimal")
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}
