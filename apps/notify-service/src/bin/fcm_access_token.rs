//! # FCM アクセストークン発行ツール
//!
//! サービスアカウントから FCM v1 API 用のアクセストークンを発行し、標準出力に書き出す。
//! 発行したトークンは `FCM_ACCESS_TOKEN` に設定して使える。
//!
//! ```bash
//! FIREBASE_ADMIN_FILE=service-account.json cargo run -p lightestate-notify-service --bin fcm-access-token
//! ```

use std::path::PathBuf;

use anyhow::Context;
use lightestate_infra::{
    access_token::{AccessTokenProvider, ServiceAccountTokenProvider},
    credential::CredentialSource,
};
use lightestate_notify_service::config::DEFAULT_SERVICE_ACCOUNT_FILE;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 標準出力はトークン専用のため、トレーシングは初期化しない
    dotenvy::dotenv().ok();

    let source = CredentialSource::select(
        std::env::var("FIREBASE_ADMIN_JSON").ok(),
        std::env::var("FIREBASE_ADMIN_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE), PathBuf::from),
    );
    let key = source
        .load()
        .context("サービスアカウントの読み込みに失敗しました")?;

    let provider = ServiceAccountTokenProvider::new(key);
    eprintln!("project_id: {}", provider.project_id());

    let token = provider
        .get_token()
        .await
        .context("アクセストークンの発行に失敗しました")?;
    println!("{token}");

    Ok(())
}
