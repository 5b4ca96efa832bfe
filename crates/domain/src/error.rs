//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | リクエスト項目の欠落・不正 |
//! | `NotFound` | 404 Not Found | 参照先の物件・レコードが存在しない |
//!
//! 機能ごとのエラー（[`EmailError`](crate::email::EmailError)、
//! [`PushError`](crate::push::PushError)）は各モジュールで定義する。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 必須項目の欠落や、空文字列などの不正なフォーマット。
    #[error("{0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// エンティティの種類（"Building" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },
}

impl DomainError {
    /// 必須項目が欠けていることを表すバリデーションエラーを生成する
    ///
    /// メッセージはそのまま API 利用者に返る。
    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("Missing required field: {field}"))
    }
}
