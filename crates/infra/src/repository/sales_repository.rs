//! # SupabaseSalesRepository
//!
//! `vendas`（販売）と `empreendimentos`（建物）テーブルから
//! LED 表示に必要なデータを取得する。

use async_trait::async_trait;
use lightestate_domain::sale::{ApartmentSale, BuildingConfig, BuildingId};
use serde_json::Value;

use super::SalesRepository;
use crate::{
    error::InfraError,
    supabase::{SupabaseClient, eq},
};

const SALES_TABLE: &str = "vendas";
const BUILDINGS_TABLE: &str = "empreendimentos";

/// Supabase 実装の SalesRepository
#[derive(Clone)]
pub struct SupabaseSalesRepository {
    client: SupabaseClient,
}

impl SupabaseSalesRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

/// 販売行から住戸番号を取り出す
///
/// 住戸番号が欠落・非数値の行は読み飛ばす。
fn parse_sales(rows: &[Value]) -> Vec<ApartmentSale> {
    rows.iter()
        .filter_map(|row| row.get("numero_apartamento"))
        .filter_map(ApartmentSale::from_value)
        .collect()
}

fn parse_building_config(rows: &[Value]) -> Option<BuildingConfig> {
    rows.first()
        .map(|row| BuildingConfig::from_raw(row.get("base"), row.get("total")))
}

#[async_trait]
impl SalesRepository for SupabaseSalesRepository {
    async fn list_sales(&self, building_id: &BuildingId) -> Result<Vec<ApartmentSale>, InfraError> {
        let rows = self
            .client
            .select(
                SALES_TABLE,
                &[
                    ("select", "numero_apartamento".to_string()),
                    ("empreendimento_id", eq(building_id)),
                ],
            )
            .await?;

        Ok(parse_sales(&rows))
    }

    async fn get_building_config(
        &self,
        building_id: &BuildingId,
    ) -> Result<Option<BuildingConfig>, InfraError> {
        let rows = self
            .client
            .select(
                BUILDINGS_TABLE,
                &[
                    ("select", "id,base,total".to_string()),
                    ("id", eq(building_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(parse_building_config(&rows))
    }
}
