//! # Light Estate Notify Service サーバー
//!
//! 販売状況の LED 表示とプッシュ通知・メール送信を担う API サーバー。
//!
//! ## アーキテクチャ
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │  Mobile App  │────▶│ Notify Service │────▶│   Supabase   │
//! │  LED Panel   │     │   port: 3000   │     └──────────────┘
//! └──────────────┘     └────────────────┘
//!                         │           │
//!                         ▼           ▼
//!                   ┌─────────┐ ┌──────────┐
//!                   │   FCM   │ │ Postmark │
//!                   └─────────┘ └──────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `PORT` | No | ポート番号（デフォルト: `3000`） |
//! | `SUPABASE_URL` | **Yes** | Supabase プロジェクト URL |
//! | `SUPABASE_SERVICE_KEY` | **Yes** | service_role キー |
//! | `PUSH_BACKEND` | No | `fcm_v1` / `fcm_legacy` / `noop`（デフォルト: `noop`） |
//! | `FIREBASE_ADMIN_JSON` | No | サービスアカウント JSON（`FIREBASE_ADMIN_FILE` より優先） |
//! | `FIREBASE_ADMIN_FILE` | No | サービスアカウント JSON のパス |
//! | `FCM_ACCESS_TOKEN` | No | 事前発行済みアクセストークン |
//! | `FCM_SERVER_KEY` | fcm_legacy 時 | レガシー API のサーバーキー |
//! | `PUSH_MAX_IN_FLIGHT` | No | 一斉配信の同時送信数（デフォルト: `8`） |
//! | `EMAIL_BACKEND` | No | `postmark` / `noop`（デフォルト: `noop`） |
//! | `POSTMARK_TOKEN` | postmark 時 | Postmark サーバートークン |
//! | `EMAIL_FROM_ADDRESS` | No | 送信元アドレス |
//! | `RELAY_ADDRESS` | No | 受信 Webhook の中継アドレス |
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p lightestate-notify-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use lightestate_domain::email::RelayAddress;
use lightestate_infra::{
    access_token::{AccessTokenProvider, ServiceAccountTokenProvider, StaticTokenProvider},
    email::{EmailTransport, NoopEmailTransport, PostmarkEmailTransport},
    push::{FcmLegacyTransport, FcmV1Transport, NoopPushTransport, PushTransport},
    repository::{SupabaseSalesRepository, SupabaseTokenStore},
    supabase::SupabaseClient,
};
use lightestate_notify_service::{
    app_builder::{AppDependencies, build_app},
    config::{ConfigError, EmailBackend, EmailConfig, PushBackend, PushConfig, ServiceConfig},
};
use lightestate_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Notify Service のエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. 送信手段の初期化（認証情報はここで読み込み、失敗したら起動しない）
/// 5. ルーターの構築
/// 6. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("notify-service"));
    let _tracing_guard = tracing::info_span!("app", service = "notify-service").entered();

    // 設定読み込み
    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Notify Service を起動します: {}:{}",
        config.host,
        config.port
    );

    // 依存関係の初期化
    let supabase = SupabaseClient::new(&config.supabase.url, config.supabase.service_key.clone());
    let push_transport = build_push_transport(&config.push)?;
    let email_transport = build_email_transport(&config.email)?;

    let app = build_app(AppDependencies {
        sales_repository: Arc::new(SupabaseSalesRepository::new(supabase.clone())),
        token_store: Arc::new(SupabaseTokenStore::new(supabase)),
        push_transport,
        email_transport,
        max_in_flight: config.push.max_in_flight,
        from_address: config.email.from_address.clone(),
        relay: RelayAddress::new(&config.email.relay_address),
    });

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notify Service が起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// 設定に応じたプッシュ送信手段を作る
fn build_push_transport(config: &PushConfig) -> anyhow::Result<Arc<dyn PushTransport>> {
    let transport: Arc<dyn PushTransport> = match config.backend {
        PushBackend::FcmV1 => {
            // project_id はサービスアカウントから取得するため、常に読み込む
            let key = config
                .credential
                .load()
                .context("サービスアカウントの読み込みに失敗しました")?;
            let project_id = key.project_id.clone();
            let tokens: Arc<dyn AccessTokenProvider> = match &config.access_token {
                Some(token) => {
                    tracing::info!("事前発行済みの FCM アクセストークンを使用します");
                    Arc::new(StaticTokenProvider::new(token.clone()))
                }
                None => Arc::new(ServiceAccountTokenProvider::new(key)),
            };
            Arc::new(FcmV1Transport::new(project_id, tokens))
        }
        PushBackend::FcmLegacy => {
            let server_key = config
                .server_key
                .clone()
                .ok_or(ConfigError::Missing("FCM_SERVER_KEY"))?;
            Arc::new(FcmLegacyTransport::new(server_key))
        }
        PushBackend::Noop => {
            tracing::warn!("PUSH_BACKEND=noop: プッシュ通知は送信されません");
            Arc::new(NoopPushTransport)
        }
    };
    Ok(transport)
}

/// 設定に応じたメール送信手段を作る
fn build_email_transport(config: &EmailConfig) -> anyhow::Result<Arc<dyn EmailTransport>> {
    let transport: Arc<dyn EmailTransport> = match config.backend {
        EmailBackend::Postmark => {
            let token = config
                .postmark_token
                .clone()
                .ok_or(ConfigError::Missing("POSTMARK_TOKEN"))?;
            Arc::new(PostmarkEmailTransport::new(token))
        }
        EmailBackend::Noop => {
            tracing::warn!("EMAIL_BACKEND=noop: メールは送信されません");
            Arc::new(NoopEmailTransport)
        }
    };
    Ok(transport)
}
