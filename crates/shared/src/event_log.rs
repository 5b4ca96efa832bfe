//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で調査しやすいよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用する。JSON 出力ではフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const PUSH: &str = "push";
        pub const EMAIL: &str = "email";
        pub const LED: &str = "led";
    }

    /// イベントアクション
    pub mod action {
        // プッシュ通知
        pub const PUSH_FANOUT_COMPLETED: &str = "push.fanout_completed";
        pub const PUSH_SENT: &str = "push.sent";
        pub const PUSH_FAILED: &str = "push.failed";
        pub const PUSH_TOKEN_INVALIDATED: &str = "push.token_invalidated";
        pub const PUSH_TOKEN_REGISTERED: &str = "push.token_registered";

        // メール
        pub const EMAIL_SENT: &str = "email.sent";
        pub const EMAIL_FAILED: &str = "email.failed";
        pub const RELAY_RECEIVED: &str = "relay.received";

        // LED
        pub const LED_STATUS_SERVED: &str = "led.status_served";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// 外部サービス呼び出し（Supabase、FCM、Postmark）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// 認証情報（サービスアカウント、アクセストークン）
        pub const CREDENTIAL: &str = "credential";
    }

    /// エラー種別
    pub mod kind {
        pub const PUSH_TRANSPORT: &str = "push_transport";
        pub const ACCESS_TOKEN: &str = "access_token";
        pub const TOKEN_REMOVAL: &str = "token_removal";
    }
}
