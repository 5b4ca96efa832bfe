//! # プッシュ通知
//!
//! プッシュ通知の宛先・ペイロード・配信結果のドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`PushTarget`] | 配信先（端末の登録トークン） |
//! | [`NotificationPayload`] | 通知内容（タイトル・本文・メタデータ） |
//! | [`DeliveryOutcome`] | 配信先ごとの配信結果 |
//! | [`FanoutResult`] | 一斉配信の集計結果 |
//!
//! ## 設計方針
//!
//! - **部分失敗の許容**: 配信先ごとの失敗は [`DeliveryOutcome`] に閉じ込め、
//!   一斉配信全体を失敗させない
//! - **無効トークンの判定**: 送信エラーが恒久的（登録解除済み）かどうかは
//!   トランスポートが [`PushSendError::permanent`] で分類する

use std::collections::BTreeMap;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 端末の登録トークン
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[display("{_0}")]
#[serde(transparent)]
pub struct PushToken(String);

impl PushToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 配信先
///
/// クライアントがプッシュ通知を登録した時点で外部（Supabase）に作成される。
/// 恒久的な送信失敗が報告された場合のみ、一斉配信の副作用として削除される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTarget {
    pub token:       PushToken,
    /// 所有者のメールアドレス（通知対象の絞り込みに使う）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

impl PushTarget {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token:       PushToken::new(token),
            owner_email: None,
        }
    }

    pub fn owned_by(mut self, email: impl Into<String>) -> Self {
        self.owner_email = Some(email.into());
        self
    }
}

/// 通知内容
///
/// `data` はトランスポートにそのまま渡されるメタデータ
/// （`apartmentNumber`、`propertyName` など）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body:  String,
    pub data:  BTreeMap<String, String>,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body:  body.into(),
            data:  BTreeMap::new(),
        }
    }

    /// メタデータを 1 件追加する
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// data-only メッセージ用に `title` / `body` をメタデータへ統合する
    ///
    /// Web クライアントはバックグラウンドで data-only メッセージを受け取り、
    /// 自前で表示を組み立てる。メタデータに同名キーがある場合は
    /// `title` / `body` フィールドの値を優先する。
    pub fn to_data_message(&self) -> BTreeMap<String, String> {
        let mut data = self.data.clone();
        data.insert("title".to_string(), self.title.clone());
        data.insert("body".to_string(), self.body.clone());
        data
    }
}

/// トランスポートが返す配信先ごとの送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("プッシュ送信に失敗 ({error_code}): {message}")]
pub struct PushSendError {
    /// トランスポート固有のエラーコード（例: `UNREGISTERED`, `NotRegistered`）
    pub error_code: String,
    /// 登録トークンが恒久的に無効（再送しても成功しない）
    pub permanent:  bool,
    pub message:    String,
}

impl PushSendError {
    /// 一時的な失敗（トークンは残す）
    pub fn transient(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            permanent:  false,
            message:    message.into(),
        }
    }

    /// 恒久的な失敗（トークンは削除対象）
    pub fn permanent(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            permanent:  true,
            message:    message.into(),
        }
    }
}

/// 配信先ごとの配信結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub target: PushTarget,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub should_invalidate_target: bool,
}

impl DeliveryOutcome {
    pub fn delivered(target: PushTarget) -> Self {
        Self {
            target,
            succeeded: true,
            error_code: None,
            should_invalidate_target: false,
        }
    }

    /// 送信エラーから失敗結果を作る
    ///
    /// `should_invalidate_target` はエラーの恒久性から導出する。
    pub fn failed(target: PushTarget, error: &PushSendError) -> Self {
        Self {
            target,
            succeeded: false,
            error_code: Some(error.error_code.clone()),
            should_invalidate_target: error.permanent,
        }
    }
}

/// 一斉配信の集計結果
///
/// `outcomes` の順序は入力した配信先の順序と一致する。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanoutResult {
    pub sent_count:   usize,
    pub failed_count: usize,
    pub outcomes:     Vec<DeliveryOutcome>,
}

impl FanoutResult {
    /// 配信先が 0 件のときの結果
    pub fn empty() -> Self {
        Self::default()
    }

    /// 配信結果の列から件数を集計する
    pub fn from_outcomes(outcomes: Vec<DeliveryOutcome>) -> Self {
        let sent_count = outcomes.iter().filter(|o| o.succeeded).count();
        Self {
            sent_count,
            failed_count: outcomes.len() - sent_count,
            outcomes,
        }
    }

    /// 無効化された配信先のトークン
    pub fn invalidated_tokens(&self) -> impl Iterator<Item = &PushToken> {
        self.outcomes
            .iter()
            .filter(|o| o.should_invalidate_target)
            .map(|o| &o.target.token)
    }
}

/// 通知の宛先範囲
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushAudience {
    /// 登録済みの全配信先
    All,
    /// 指定メールアドレスが所有する配信先のみ
    Owner(String),
}

impl PushAudience {
    /// 任意指定のメールアドレスから宛先範囲を決める
    ///
    /// 空文字列や空白のみは未指定として扱う。
    pub fn from_owner(owner_email: Option<&str>) -> Self {
        match owner_email.map(str::trim) {
            Some(email) if !email.is_empty() => Self::Owner(email.to_string()),
            _ => Self::All,
        }
    }
}

/// 一斉配信全体を中断させるエラー
#[derive(Debug, Error)]
pub enum PushError {
    /// 配信ループ開始前の準備（認証情報の取得など）に失敗
    #[error("プッシュ配信基盤が利用できません: {0}")]
    TransportUnavailable(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_to_data_messageがtitleとbodyを統合する() {
        let payload = NotificationPayload::new("New sale!", "Apt 203 (Torre Sul) sold.")
            .with_data("apartmentNumber", "203")
            .with_data("title", "上書きされる");

        let data = payload.to_data_message();

        assert_eq!(data.get("title").map(String::as_str), Some("New sale!"));
        assert_eq!(
            data.get("body").map(String::as_str),
            Some("Apt 203 (Torre Sul) sold.")
        );
        assert_eq!(data.get("apartmentNumber").map(String::as_str), Some("203"));
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_failedは恒久エラーで無効化フラグを立てる() {
        let target = PushTarget::new("tok-1");
        let outcome =
            DeliveryOutcome::failed(target.clone(), &PushSendError::permanent("UNREGISTERED", ""));

        assert!(!outcome.succeeded);
        assert!(outcome.should_invalidate_target);
        assert_eq!(outcome.error_code.as_deref(), Some("UNREGISTERED"));

        let outcome = DeliveryOutcome::failed(target, &PushSendError::transient("UNAVAILABLE", ""));
        assert!(!outcome.should_invalidate_target);
    }

    #[test]
    fn test_from_outcomesが件数を集計する() {
        let result = FanoutResult::from_outcomes(vec![
            DeliveryOutcome::delivered(PushTarget::new("a")),
            DeliveryOutcome::failed(
                PushTarget::new("b"),
                &PushSendError::permanent("UNREGISTERED", "gone"),
            ),
            DeliveryOutcome::delivered(PushTarget::new("c")),
        ]);

        assert_eq!(result.sent_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(
            result.invalidated_tokens().collect::<Vec<_>>(),
            vec![&PushToken::new("b")]
        );
    }

    #[test]
    fn test_emptyは全て0() {
        let result = FanoutResult::empty();
        assert_eq!(result.sent_count, 0);
        assert_eq!(result.failed_count, 0);
        assert!(result.outcomes.is_empty());
    }

    #[test]
    fn test_delivery_outcomeのjson形状() {
        let outcome = DeliveryOutcome::failed(
            PushTarget::new("tok").owned_by("ana@example.com"),
            &PushSendError::transient("UNAVAILABLE", "retry later"),
        );
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "target": { "token": "tok", "ownerEmail": "ana@example.com" },
                "succeeded": false,
                "errorCode": "UNAVAILABLE",
                "shouldInvalidateTarget": false,
            })
        );
    }

    #[test]
    fn test_from_ownerは空白を未指定として扱う() {
        assert_eq!(PushAudience::from_owner(None), PushAudience::All);
        assert_eq!(PushAudience::from_owner(Some("  ")), PushAudience::All);
        assert_eq!(
            PushAudience::from_owner(Some(" ana@example.com ")),
            PushAudience::Owner("ana@example.com".to_string())
        );
    }
}
