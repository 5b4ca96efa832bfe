//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! lightestate-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 各モックは `Clone` で内部状態（`Arc<Mutex<_>>`）を共有するため、
//! テスト側に残したクローンから呼び出し履歴を検証できる。

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use lightestate_domain::{
    email::EmailMessage,
    push::{NotificationPayload, PushSendError, PushTarget, PushToken},
    sale::{ApartmentSale, BuildingConfig, BuildingId},
};

use crate::{
    access_token::AccessTokenProvider,
    email::EmailTransport,
    error::InfraError,
    push::PushTransport,
    repository::{SalesRepository, TokenStore},
};

// ===== MockSalesRepository =====

#[derive(Clone, Default)]
pub struct MockSalesRepository {
    buildings: Arc<Mutex<HashMap<BuildingId, BuildingConfig>>>,
    sales:     Arc<Mutex<HashMap<BuildingId, Vec<ApartmentSale>>>>,
    fail_with: Arc<Mutex<Option<u16>>>,
}

impl MockSalesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_building(&self, id: &BuildingId, config: BuildingConfig) {
        self.buildings.lock().unwrap().insert(id.clone(), config);
    }

    pub fn add_sale(&self, id: &BuildingId, apartment_number: i64) {
        self.sales
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .push(ApartmentSale::new(apartment_number));
    }

    /// 以降の呼び出しを指定ステータスの上流エラーにする
    pub fn fail_with_status(&self, status: u16) {
        *self.fail_with.lock().unwrap() = Some(status);
    }

    fn check_failure(&self) -> Result<(), InfraError> {
        match *self.fail_with.lock().unwrap() {
            Some(status) => Err(InfraError::upstream(
                "supabase",
                status,
                r#"{"message":"mock failure"}"#,
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SalesRepository for MockSalesRepository {
    async fn list_sales(&self, building_id: &BuildingId) -> Result<Vec<ApartmentSale>, InfraError> {
        self.check_failure()?;
        Ok(self
            .sales
            .lock()
            .unwrap()
            .get(building_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_building_config(
        &self,
        building_id: &BuildingId,
    ) -> Result<Option<BuildingConfig>, InfraError> {
        self.check_failure()?;
        Ok(self.buildings.lock().unwrap().get(building_id).copied())
    }
}

// ===== MockTokenStore =====

#[derive(Clone, Default)]
pub struct MockTokenStore {
    targets:      Arc<Mutex<Vec<PushTarget>>>,
    removed:      Arc<Mutex<Vec<PushToken>>>,
    fail_removal: Arc<Mutex<bool>>,
    fail_listing: Arc<Mutex<bool>>,
}

impl MockTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: Vec<PushTarget>) -> Self {
        let store = Self::new();
        *store.targets.lock().unwrap() = targets;
        store
    }

    /// `remove` を常に失敗させる
    pub fn fail_removal(&self) {
        *self.fail_removal.lock().unwrap() = true;
    }

    /// `list_all` / `find_by_owner` を常に失敗させる
    pub fn fail_listing(&self) {
        *self.fail_listing.lock().unwrap() = true;
    }

    /// `remove` が呼ばれたトークン（呼び出し順）
    pub fn removed(&self) -> Vec<PushToken> {
        self.removed.lock().unwrap().clone()
    }

    /// 現在保存されている配信先
    pub fn targets(&self) -> Vec<PushTarget> {
        self.targets.lock().unwrap().clone()
    }

    fn check_listing(&self) -> Result<(), InfraError> {
        if *self.fail_listing.lock().unwrap() {
            return Err(InfraError::upstream(
                "supabase",
                500,
                r#"{"message":"mock listing failure"}"#,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MockTokenStore {
    async fn list_all(&self) -> Result<Vec<PushTarget>, InfraError> {
        self.check_listing()?;
        Ok(self.targets())
    }

    async fn find_by_owner(&self, email: &str) -> Result<Vec<PushTarget>, InfraError> {
        self.check_listing()?;
        Ok(self
            .targets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner_email.as_deref() == Some(email))
            .cloned()
            .collect())
    }

    async fn register(&self, target: &PushTarget) -> Result<(), InfraError> {
        let mut targets = self.targets.lock().unwrap();
        match targets.iter_mut().find(|t| t.token == target.token) {
            Some(existing) => existing.owner_email.clone_from(&target.owner_email),
            None => targets.push(target.clone()),
        }
        Ok(())
    }

    async fn remove(&self, token: &PushToken) -> Result<(), InfraError> {
        self.removed.lock().unwrap().push(token.clone());
        if *self.fail_removal.lock().unwrap() {
            return Err(InfraError::upstream(
                "supabase",
                503,
                r#"{"message":"mock removal failure"}"#,
            ));
        }
        self.targets.lock().unwrap().retain(|t| &t.token != token);
        Ok(())
    }
}

// ===== MockPushTransport =====

#[derive(Clone, Default)]
pub struct MockPushTransport {
    failures:      Arc<Mutex<HashMap<PushToken, PushSendError>>>,
    delays:        Arc<Mutex<HashMap<PushToken, Duration>>>,
    prepare_error: Arc<Mutex<Option<String>>>,
    sent:          Arc<Mutex<Vec<PushToken>>>,
    prepare_calls: Arc<Mutex<usize>>,
}

impl MockPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定トークンへの送信を失敗させる
    pub fn fail_token(&self, token: &str, error: PushSendError) {
        self.failures
            .lock()
            .unwrap()
            .insert(PushToken::new(token), error);
    }

    /// 指定トークンへの送信完了を遅らせる
    pub fn delay_token(&self, token: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(PushToken::new(token), delay);
    }

    /// `prepare` を失敗させる
    pub fn fail_prepare(&self, message: &str) {
        *self.prepare_error.lock().unwrap() = Some(message.to_string());
    }

    /// `send` が完了したトークン（完了順）
    pub fn sent(&self) -> Vec<PushToken> {
        self.sent.lock().unwrap().clone()
    }

    /// `send` が呼ばれたトークンの集合
    pub fn sent_set(&self) -> HashSet<PushToken> {
        self.sent().into_iter().collect()
    }

    pub fn prepare_calls(&self) -> usize {
        *self.prepare_calls.lock().unwrap()
    }
}

#[async_trait]
impl PushTransport for MockPushTransport {
    async fn prepare(&self) -> Result<(), InfraError> {
        *self.prepare_calls.lock().unwrap() += 1;
        match self.prepare_error.lock().unwrap().clone() {
            Some(message) => Err(InfraError::auth(message)),
            None => Ok(()),
        }
    }

    async fn send(
        &self,
        token: &PushToken,
        _payload: &NotificationPayload,
    ) -> Result<(), PushSendError> {
        let delay = self.delays.lock().unwrap().get(token).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(token.clone());
        match self.failures.lock().unwrap().get(token) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

// ===== MockEmailTransport =====

#[derive(Clone, Default)]
pub struct MockEmailTransport {
    sent:      Arc<Mutex<Vec<EmailMessage>>>,
    fail_with: Arc<Mutex<Option<(u16, String)>>>,
}

impl MockEmailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送信を指定ステータス・ボディの上流エラーにする
    pub fn fail_with(&self, status: u16, body: &str) {
        *self.fail_with.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for MockEmailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<(), InfraError> {
        if let Some((status, body)) = self.fail_with.lock().unwrap().clone() {
            return Err(InfraError::upstream("postmark", status, body));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== MockAccessTokenProvider =====

#[derive(Clone, Default)]
pub struct MockAccessTokenProvider {
    token: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockAccessTokenProvider {
    /// 常に指定トークンを返すプロバイダ
    pub fn returning(token: &str) -> Self {
        let provider = Self::default();
        *provider.token.lock().unwrap() = Some(token.to_string());
        provider
    }

    /// 常に失敗するプロバイダ
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl AccessTokenProvider for MockAccessTokenProvider {
    async fn get_token(&self) -> Result<String, InfraError> {
        *self.calls.lock().unwrap() += 1;
        self.token
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| InfraError::auth("mock: トークンを取得できません"))
    }
}
