//! # 販売記録と物件設定
//!
//! Supabase の `vendas` / `empreendimentos` テーブルから読み出した値を
//! ドメインの型に変換する。
//!
//! 行データは型が揃っていない（数値が文字列で入っている、`null` がある）ため、
//! ここでは緩いパースを行い、解釈できない値は `None` として扱う。

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DomainError, push::NotificationPayload};

/// LED 総数のデフォルト値
pub const DEFAULT_LED_TOTAL: u32 = 49;

/// 1 フロアあたりの住戸数（列数）のデフォルト値
pub const DEFAULT_COLUMNS_PER_FLOOR: u32 = 7;

/// 最下階の階番号のデフォルト値
pub const DEFAULT_BASE_FLOOR: u32 = 1;

/// 物件（建物）ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[display("{_0}")]
pub struct BuildingId(String);

impl BuildingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 販売記録
///
/// `apartment_number` は `階 * 100 + 列` でエンコードされている（列は 1 始まり）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApartmentSale {
    pub apartment_number: i64,
}

impl ApartmentSale {
    pub fn new(apartment_number: i64) -> Self {
        Self { apartment_number }
    }

    /// 行データのセルから販売記録を組み立てる
    ///
    /// 整数値または整数を表す文字列のみ受け付ける。
    /// それ以外（`null`、非数値文字列、小数など）は `None`。
    pub fn from_value(value: &Value) -> Option<Self> {
        parse_integer(value).map(Self::new)
    }
}

/// 物件ごとの LED 設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingConfig {
    /// 最下階の階番号
    ///
    /// 設定としては受け付けるが、LED インデックスの計算式では使用しない。
    pub base:              u32,
    /// LED の総数。範囲外のインデックスは出力から除外される
    pub total:             u32,
    /// 1 フロアあたりの住戸数
    pub columns_per_floor: u32,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            base:              DEFAULT_BASE_FLOOR,
            total:             DEFAULT_LED_TOTAL,
            columns_per_floor: DEFAULT_COLUMNS_PER_FLOOR,
        }
    }
}

impl BuildingConfig {
    /// 行データの `base` / `total` から設定を組み立てる
    ///
    /// 値が無い、数値として解釈できない、または 1 未満の場合はデフォルト値を使う。
    pub fn from_raw(base: Option<&Value>, total: Option<&Value>) -> Self {
        let defaults = Self::default();
        Self {
            base: base.and_then(parse_positive).unwrap_or(defaults.base),
            total: total.and_then(parse_positive).unwrap_or(defaults.total),
            columns_per_floor: defaults.columns_per_floor,
        }
    }

    /// 1 フロアあたりの住戸数を差し替える
    pub fn with_columns_per_floor(mut self, columns_per_floor: u32) -> Self {
        self.columns_per_floor = columns_per_floor;
        self
    }
}

/// 販売通知の内容
///
/// 営業担当者が販売を登録したときに、登録済みの端末へ一斉配信する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleAnnouncement {
    pub property:         String,
    pub apartment_number: String,
    pub floor:            String,
    pub user:             String,
    pub date:             String,
}

impl SaleAnnouncement {
    /// 全項目が空でないことを検証して組み立てる
    pub fn new(
        property: impl Into<String>,
        apartment_number: impl Into<String>,
        floor: impl Into<String>,
        user: impl Into<String>,
        date: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let announcement = Self {
            property:         property.into(),
            apartment_number: apartment_number.into(),
            floor:            floor.into(),
            user:             user.into(),
            date:             date.into(),
        };

        for (field, value) in [
            ("property", &announcement.property),
            ("apartmentNumber", &announcement.apartment_number),
            ("floor", &announcement.floor),
            ("user", &announcement.user),
            ("date", &announcement.date),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::missing_field(field));
            }
        }

        Ok(announcement)
    }

    /// プッシュ通知のペイロードに変換する
    pub fn push_payload(&self) -> NotificationPayload {
        NotificationPayload::new(
            "New sale!",
            format!("Apt {} ({}) sold.", self.apartment_number, self.property),
        )
        .with_data("propertyName", self.property.as_str())
        .with_data("apartmentNumber", self.apartment_number.as_str())
        .with_data("floor", self.floor.as_str())
        .with_data("user", self.user.as_str())
        .with_data("saleDate", self.date.as_str())
    }
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_positive(value: &Value) -> Option<u32> {
    parse_integer(value)
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!(203), Some(203))]
    #[case(json!("305"), Some(305))]
    #[case(json!(" 101 "), Some(101))]
    #[case(json!(402.0), Some(402))]
    #[case(json!(0), Some(0))]
    #[case(json!(-5), Some(-5))]
    #[case(json!("abc"), None)]
    #[case(json!(""), None)]
    #[case(json!(10.5), None)]
    #[case(json!(null), None)]
    #[case(json!(true), None)]
    fn test_from_valueが数値と数値文字列のみ受け付ける(
        #[case] value: Value,
        #[case] expected: Option<i64>,
    ) {
        assert_eq!(
            ApartmentSale::from_value(&value).map(|s| s.apartment_number),
            expected
        );
    }

    #[test]
    fn test_defaultは49個の7列() {
        let config = BuildingConfig::default();
        assert_eq!(config.total, 49);
        assert_eq!(config.columns_per_floor, 7);
        assert_eq!(config.base, 1);
    }

    #[test]
    fn test_from_rawは数値文字列のtotalを受け付ける() {
        let config = BuildingConfig::from_raw(Some(&json!(2)), Some(&json!("63")));
        assert_eq!(config.base, 2);
        assert_eq!(config.total, 63);
    }

    fn make_announcement() -> SaleAnnouncement {
        SaleAnnouncement::new("Torre Sul", "203", "2", "ana@example.com", "2026-10-16").unwrap()
    }

    #[test]
    fn test_push_payloadがタイトル本文とメタデータを持つ() {
        let payload = make_announcement().push_payload();

        assert_eq!(payload.title, "New sale!");
        assert_eq!(payload.body, "Apt 203 (Torre Sul) sold.");
        assert_eq!(
            payload.data.get("propertyName").map(String::as_str),
            Some("Torre Sul")
        );
        assert_eq!(
            payload.data.get("apartmentNumber").map(String::as_str),
            Some("203")
        );
        assert_eq!(payload.data.get("floor").map(String::as_str), Some("2"));
        assert_eq!(
            payload.data.get("saleDate").map(String::as_str),
            Some("2026-10-16")
        );
    }

    #[rstest]
    #[case("", "203", "2", "ana", "2026-10-16", "property")]
    #[case("Torre Sul", " ", "2", "ana", "2026-10-16", "apartmentNumber")]
    #[case("Torre Sul", "203", "", "ana", "2026-10-16", "floor")]
    #[case("Torre Sul", "203", "2", "", "2026-10-16", "user")]
    #[case("Torre Sul", "203", "2", "ana", "", "date")]
    fn test_sale_announcementは空の項目を拒否する(
        #[case] property: &str,
        #[case] apartment_number: &str,
        #[case] floor: &str,
        #[case] user: &str,
        #[case] date: &str,
        #[case] field: &str,
    ) {
        let err = SaleAnnouncement::new(property, apartment_number, floor, user, date).unwrap_err();
        assert!(err.to_string().contains(field), "{err}");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(json!(null)))]
    #[case(Some(json!("muitos")))]
    #[case(Some(json!(0)))]
    #[case(Some(json!(-3)))]
    fn test_from_rawは不正なtotalで49にフォールバックする(#[case] total: Option<Value>) {
        let config = BuildingConfig::from_raw(None, total.as_ref());
        assert_eq!(config.total, DEFAULT_LED_TOTAL);
        assert_eq!(config.base, DEFAULT_BASE_FLOOR);
    }
}
