//! # リポジトリ
//!
//! Supabase に保存された販売データと配信先トークンへのアクセスを抽象化する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: ユースケースは `Arc<dyn SalesRepository>` 等に依存し、
//!   テストでは [`crate::mock`] のインメモリ実装に差し替える
//! - **外部スキーマの吸収**: Supabase のテーブル名・列名はこの層に閉じ込める

mod push_token_repository;
mod sales_repository;

use async_trait::async_trait;
use lightestate_domain::{
    push::{PushTarget, PushToken},
    sale::{ApartmentSale, BuildingConfig, BuildingId},
};
pub use push_token_repository::SupabaseTokenStore;
pub use sales_repository::SupabaseSalesRepository;

use crate::error::InfraError;

/// 販売データリポジトリトレイト
#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// 建物で販売済みの住戸を取得する
    async fn list_sales(&self, building_id: &BuildingId) -> Result<Vec<ApartmentSale>, InfraError>;

    /// 建物の LED 構成を取得する（建物が存在しなければ `None`）
    async fn get_building_config(
        &self,
        building_id: &BuildingId,
    ) -> Result<Option<BuildingConfig>, InfraError>;
}

/// 配信先トークンストアトレイト
///
/// トークンの作成はクライアントが行う。サービス側は参照と、
/// 恒久的に無効となったトークンの削除を担当する。
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// 登録済みの全配信先を取得する
    async fn list_all(&self) -> Result<Vec<PushTarget>, InfraError>;

    /// 指定メールアドレスが所有する配信先を取得する
    async fn find_by_owner(&self, email: &str) -> Result<Vec<PushTarget>, InfraError>;

    /// 配信先を登録する（既存トークンは所有者を更新）
    async fn register(&self, target: &PushTarget) -> Result<(), InfraError>;

    /// トークンを削除する
    async fn remove(&self, token: &PushToken) -> Result<(), InfraError>;
}
