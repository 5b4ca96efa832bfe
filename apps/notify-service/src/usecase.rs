//! # ユースケース層
//!
//! Notify Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・送信手段を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `fanout`: プッシュ一斉配信（部分失敗の集計・無効トークンの削除）
//! - `led_status`: 販売済み住戸の LED 表示
//! - `sale_notification`: 販売通知のプッシュ配信
//! - `email`: 販売登録メールの送信
//! - `inbound_relay`: 中継メールからのプッシュ配信
//! - `push_token`: 配信先トークンの登録

pub mod email;
pub mod fanout;
pub mod inbound_relay;
pub mod led_status;
pub mod push_token;
pub mod sale_notification;

pub use email::EmailUseCaseImpl;
pub use fanout::PushFanoutDispatcher;
pub use inbound_relay::InboundRelayUseCaseImpl;
pub use led_status::LedStatusUseCaseImpl;
use lightestate_domain::push::{PushAudience, PushTarget};
use lightestate_infra::repository::TokenStore;
pub use push_token::PushTokenUseCaseImpl;
pub use sale_notification::{SaleNotification, SaleNotificationUseCaseImpl};

use crate::error::ApiError;

/// 宛先範囲に含まれる配信先を取得する
pub(crate) async fn resolve_targets(
    store: &dyn TokenStore,
    audience: &PushAudience,
) -> Result<Vec<PushTarget>, ApiError> {
    let targets = match audience {
        PushAudience::All => store.list_all().await,
        PushAudience::Owner(email) => store.find_by_owner(email).await,
    };
    targets.map_err(|e| ApiError::upstream("Supabase error", e))
}
