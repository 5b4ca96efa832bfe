//! # Light Estate インフラ層
//!
//! 外部サービスとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! ユースケースが依存する協調オブジェクト（リポジトリ・送信手段）を trait で定義し、
//! その具体的な実装を提供する。外部サービスの詳細（テーブル名、API 形式、
//! エラー形式）をカプセル化し、ドメイン層を外部の変更から保護する。
//!
//! ## 責務
//!
//! - **Supabase**: 販売データと配信先トークンの読み書き（PostgREST）
//! - **FCM**: プッシュ通知の送信（HTTP v1 / legacy）とアクセストークン取得
//! - **Postmark**: トランザクションメールの送信
//!
//! ## 依存関係
//!
//! ```text
//! notify-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`supabase`] - Supabase REST クライアント
//! - [`repository`] - 販売データ・配信先トークンのリポジトリ
//! - [`push`] - プッシュ送信
//! - [`credential`] / [`access_token`] - FCM v1 用の認証情報とアクセストークン
//! - [`email`] - メール送信
//! - [`error`] - インフラ層エラー定義
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use lightestate_infra::{
//!     repository::{SupabaseTokenStore, TokenStore},
//!     supabase::SupabaseClient,
//! };
//!
//! async fn list() -> Result<(), lightestate_infra::InfraError> {
//!     let client = SupabaseClient::new("https://xyz.supabase.co", "service-key");
//!     let store = SupabaseTokenStore::new(client);
//!     let targets = store.list_all().await?;
//!     println!("{} 件", targets.len());
//!     Ok(())
//! }
//! ```

pub mod access_token;
pub mod credential;
pub mod email;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod push;
pub mod repository;
mod response;
pub mod supabase;

pub use error::InfraError;
