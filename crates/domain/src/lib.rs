//! # Light Estate ドメイン層
//!
//! 販売済み住戸の LED 表示と、販売通知（プッシュ / メール）の中核となる
//! ドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **純粋性**: HTTP、Supabase、FCM、Postmark などの外部システムには依存しない
//! - **型による制約**: 受信者ルールなどのビジネスルールは型で表現し、
//!   検証済みの値しか下流に渡らないようにする
//! - **失敗の局所化**: LED マッピングは決してエラーを返さず、
//!   不正な入力は黙って除外する
//!
//! ## 依存関係の方向
//!
//! ```text
//! notify-service → infra → domain
//!        ↘          ↓
//!          shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層のエラー定義
//! - [`sale`] - 販売記録と物件（建物）設定
//! - [`led`] - 住戸番号 → LED インデックスの変換
//! - [`push`] - プッシュ通知の宛先・ペイロード・配信結果
//! - [`email`] - メール宛先ルール（中継アドレスの扱い）
//!
//! ## 使用例
//!
//! ```rust
//! use lightestate_domain::{led, sale::BuildingConfig};
//!
//! let config = BuildingConfig::default();
//! let leds = led::map_many([203, 999_999, 101], &config);
//! assert_eq!(leds.iter().map(|l| l.get()).collect::<Vec<_>>(), vec![10, 1]);
//! ```

pub mod email;
pub mod error;
pub mod led;
pub mod push;
pub mod sale;

pub use error::DomainError;
