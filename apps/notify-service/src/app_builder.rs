//! # Notify Service アプリケーション構築
//!
//! 依存（リポジトリ・送信手段）から State を組み立て、ルーターを構築する。
//! `main.rs` は設定読み込みとインフラ初期化、サーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{MethodRouter, get, post},
};
use lightestate_domain::email::RelayAddress;
use lightestate_infra::{
    email::EmailTransport,
    push::PushTransport,
    repository::{SalesRepository, TokenStore},
};
use lightestate_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{
        EmailState,
        LedState,
        PushTokenState,
        RelayState,
        SaleState,
        health_check,
        led_status,
        method_not_allowed,
        not_found,
        notify_sale,
        preflight,
        register_push_token,
        send_email,
        webhook,
        webhook_method_not_allowed,
    },
    usecase::{
        EmailUseCaseImpl,
        InboundRelayUseCaseImpl,
        LedStatusUseCaseImpl,
        PushFanoutDispatcher,
        PushTokenUseCaseImpl,
        SaleNotificationUseCaseImpl,
    },
};

/// ルーター構築に必要な依存
pub struct AppDependencies {
    pub sales_repository: Arc<dyn SalesRepository>,
    pub token_store:      Arc<dyn TokenStore>,
    pub push_transport:   Arc<dyn PushTransport>,
    pub email_transport:  Arc<dyn EmailTransport>,
    /// 一斉配信の同時送信数
    pub max_in_flight:    usize,
    /// お知らせメールの送信元アドレス
    pub from_address:     String,
    /// 受信 Webhook でプッシュ配信を起動する中継アドレス
    pub relay:            RelayAddress,
}

/// OPTIONS と未対応メソッドの扱いを全ルートで揃える
fn endpoint<S>(router: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.options(preflight).fallback(method_not_allowed)
}

/// DI コンテナの構築とルーター定義を行う
///
/// 依存 → ユースケース → State → Router の順に組み立てる。
pub fn build_app(deps: AppDependencies) -> Router {
    // 販売通知と受信 Webhook は同じディスパッチャを共有する
    let dispatcher = Arc::new(PushFanoutDispatcher::new(
        deps.push_transport,
        deps.token_store.clone(),
        deps.max_in_flight,
    ));

    let led_state = Arc::new(LedState {
        usecase: LedStatusUseCaseImpl::new(deps.sales_repository),
    });
    let sale_state = Arc::new(SaleState {
        usecase: SaleNotificationUseCaseImpl::new(deps.token_store.clone(), dispatcher.clone()),
    });
    let email_state = Arc::new(EmailState {
        usecase: EmailUseCaseImpl::new(
            deps.email_transport,
            deps.from_address,
            deps.relay.clone(),
        ),
    });
    let relay_state = Arc::new(RelayState {
        usecase: InboundRelayUseCaseImpl::new(deps.relay, deps.token_store.clone(), dispatcher),
    });
    let push_token_state = Arc::new(PushTokenState {
        usecase: PushTokenUseCaseImpl::new(deps.token_store),
    });

    // ルーター構築
    Router::new()
        .route("/health", endpoint(get(health_check)))
        .merge(
            Router::new()
                .route("/leds-status", endpoint(get(led_status)))
                .with_state(led_state),
        )
        .merge(
            Router::new()
                .route("/notify-sale", endpoint(post(notify_sale)))
                .with_state(sale_state),
        )
        .merge(
            Router::new()
                .route("/send-email", endpoint(post(send_email)))
                .with_state(email_state),
        )
        .merge(
            Router::new()
                .route("/push-tokens", endpoint(post(register_push_token)))
                .with_state(push_token_state),
        )
        // Webhook は 405 も `{ok, message}` 形式で返す
        .merge(
            Router::new()
                .route(
                    "/webhook",
                    post(webhook)
                        .options(preflight)
                        .fallback(webhook_method_not_allowed),
                )
                .with_state(relay_state),
        )
        .fallback(not_found)
        // レイヤー順序: 下に書いたものが外側
        // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: カスタムスパンに request_id を含める
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        // 4. CorsLayer: プリフライトに応答し、全レスポンスに CORS ヘッダーを付与
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
