//! # LED インデックス変換
//!
//! 販売済み住戸の住戸番号を、物件模型の LED ストリップ上の位置（1 始まり）に変換する。
//!
//! ## 変換式
//!
//! ```text
//! floor  = apartment_number / 100
//! column = apartment_number % 100
//! index  = (floor - 1) * columns_per_floor + column
//! ```
//!
//! `1 <= index <= total` の場合のみ採用し、それ以外は除外する（エラーにはしない）。
//! 部分的に壊れた販売データがあっても一覧全体は返せるようにするため。
//!
//! ## 現状の挙動として残しているもの
//!
//! - `BuildingConfig::base` は計算式に使わない（階は常に `apartment_number / 100`）
//! - 列が `columns_per_floor` を超えていても、インデックスが範囲内なら採用する
//! - 異なる住戸が同じインデックスになっても重複除去しない

use derive_more::Display;
use serde::Serialize;

use crate::sale::{ApartmentSale, BuildingConfig};

/// LED ストリップ上の位置（1 始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize)]
#[serde(transparent)]
pub struct LedIndex(u32);

impl LedIndex {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// 住戸番号を LED インデックスに変換する
///
/// 住戸番号が 0 以下、または計算結果が `[1, total]` の範囲外なら `None`。
pub fn map_to_led_index(apartment_number: i64, config: &BuildingConfig) -> Option<LedIndex> {
    if apartment_number <= 0 {
        return None;
    }

    let floor = apartment_number / 100;
    let column = apartment_number % 100;
    let index = (floor - 1)
        .checked_mul(i64::from(config.columns_per_floor))?
        .checked_add(column)?;

    if (1..=i64::from(config.total)).contains(&index) {
        u32::try_from(index).ok().map(LedIndex)
    } else {
        None
    }
}

/// 住戸番号の列を LED インデックスの列に変換する
///
/// 入力順を保ち、変換できない要素は黙って除外する。
pub fn map_many<I>(apartment_numbers: I, config: &BuildingConfig) -> Vec<LedIndex>
where
    I: IntoIterator<Item = i64>,
{
    apartment_numbers
        .into_iter()
        .filter_map(|n| map_to_led_index(n, config))
        .collect()
}

/// 販売記録の列を LED インデックスの列に変換する
pub fn map_sales(sales: &[ApartmentSale], config: &BuildingConfig) -> Vec<LedIndex> {
    map_many(sales.iter().map(|s| s.apartment_number), config)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn indices(leds: &[LedIndex]) -> Vec<u32> {
        leds.iter().map(|l| l.get()).collect()
    }

    #[rstest]
    #[case(101, Some(1))]
    #[case(107, Some(7))]
    #[case(201, Some(8))]
    #[case(203, Some(10))]
    #[case(707, Some(49))]
    #[case(100, None)]
    #[case(801, None)]
    #[case(0, None)]
    #[case(-203, None)]
    #[case(999_999, None)]
    fn test_map_to_led_indexがデフォルト設定で変換する(
        #[case] apartment_number: i64,
        #[case] expected: Option<u32>,
    ) {
        let config = BuildingConfig::default();
        assert_eq!(
            map_to_led_index(apartment_number, &config).map(LedIndex::get),
            expected
        );
    }

    #[test]
    fn test_全有効住戸が計算式どおりに変換される() {
        let config = BuildingConfig::default();
        for floor in 1..=7_i64 {
            for column in 1..=7_i64 {
                let n = floor * 100 + column;
                let expected = u32::try_from((floor - 1) * 7 + column).unwrap();
                assert_eq!(map_to_led_index(n, &config), Some(LedIndex(expected)));
            }
        }
    }

    #[test]
    fn test_baseは計算式に影響しない() {
        let config = BuildingConfig {
            base: 3,
            ..BuildingConfig::default()
        };
        assert_eq!(map_to_led_index(203, &config), Some(LedIndex(10)));
    }

    #[test]
    fn test_列数超過でも範囲内なら採用される() {
        // 108 → (1 - 1) * 7 + 8 = 8。201 と同じ位置になる
        let config = BuildingConfig::default();
        assert_eq!(map_to_led_index(108, &config), Some(LedIndex(8)));
    }

    #[test]
    fn test_totalを超えるインデックスは除外される() {
        let config = BuildingConfig {
            total: 9,
            ..BuildingConfig::default()
        };
        assert_eq!(map_to_led_index(202, &config), Some(LedIndex(9)));
        assert_eq!(map_to_led_index(203, &config), None);
    }

    #[test]
    fn test_columns_per_floorを差し替えられる() {
        let config = BuildingConfig::default().with_columns_per_floor(4);
        assert_eq!(map_to_led_index(203, &config), Some(LedIndex(7)));
    }

    #[test]
    fn test_map_manyが入力順を保ち範囲外を除外する() {
        let config = BuildingConfig::default();
        let leds = map_many([203, 999_999, 101], &config);
        assert_eq!(indices(&leds), vec![10, 1]);
    }

    #[test]
    fn test_map_manyは0以下を除外する() {
        let config = BuildingConfig::default();
        let leds = map_many([0, -101, 102], &config);
        assert_eq!(indices(&leds), vec![2]);
    }

    #[test]
    fn test_map_manyは重複を除去しない() {
        let config = BuildingConfig::default();
        let leds = map_many([201, 108, 201], &config);
        assert_eq!(indices(&leds), vec![8, 8, 8]);
    }

    #[test]
    fn test_map_manyは空入力で空を返す() {
        let config = BuildingConfig::default();
        assert!(map_many(Vec::new(), &config).is_empty());
    }

    #[test]
    fn test_map_salesが販売記録を変換する() {
        let config = BuildingConfig::default();
        let sales = [ApartmentSale::new(305), ApartmentSale::new(0)];
        assert_eq!(indices(&map_sales(&sales, &config)), vec![19]);
    }

    #[test]
    fn test_led_indexは数値としてシリアライズされる() {
        let json = serde_json::to_value(vec![LedIndex(3), LedIndex(10)]).unwrap();
        assert_eq!(json, serde_json::json!([3, 10]));
    }
}
