//! # プッシュ一斉配信
//!
//! 通知 1 件を複数の配信先へ送信し、配信先ごとの結果を集計する。
//!
//! ## 設計方針
//!
//! - **部分失敗の許容**: 配信先ごとの失敗は結果に記録し、配信全体は継続する
//! - **1 回だけ送信**: 配信先ごとに送信は 1 回のみ。再送は行わない
//! - **無効トークンの削除**: 恒久的な失敗を報告された配信先はストアから削除する。
//!   削除の失敗は警告ログのみで、配信結果には影響しない
//! - **順序の保持**: 同時送信数を `max_in_flight` に制限しつつ、
//!   結果は入力した配信先の順序で返す。件数は全配信の完了後に結果列から集計する
//!
//! キャンセル（クライアント切断時の中断）は扱わない。必要になった場合は
//! `dispatch` の future をドロップすれば未着手の配信先は送信されない。

use std::sync::Arc;

use futures_util::{FutureExt, StreamExt, future::BoxFuture, stream};
use lightestate_domain::push::{
    DeliveryOutcome,
    FanoutResult,
    NotificationPayload,
    PushError,
    PushTarget,
};
use lightestate_infra::{push::PushTransport, repository::TokenStore};
use lightestate_shared::{
    event_log::{error, event},
    log_business_event,
};

/// プッシュ一斉配信
pub struct PushFanoutDispatcher {
    transport:     Arc<dyn PushTransport>,
    store:         Arc<dyn TokenStore>,
    max_in_flight: usize,
}

impl PushFanoutDispatcher {
    /// `max_in_flight` が 0 の場合は 1 として扱う
    pub fn new(
        transport: Arc<dyn PushTransport>,
        store: Arc<dyn TokenStore>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            transport,
            store,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// 配信先すべてに通知を送信する
    ///
    /// 配信先が 0 件なら送信手段・ストアには一切触れずに空の結果を返す。
    /// 送信手段の準備（認証情報の取得）に失敗した場合は、
    /// どの配信先にも送信せず [`PushError::TransportUnavailable`] を返す。
    pub async fn dispatch(
        &self,
        targets: &[PushTarget],
        payload: &NotificationPayload,
    ) -> Result<FanoutResult, PushError> {
        if targets.is_empty() {
            return Ok(FanoutResult::empty());
        }

        self.transport.prepare().await.map_err(|e| {
            tracing::error!(
                error.category = error::category::CREDENTIAL,
                error.kind = error::kind::PUSH_TRANSPORT,
                error = %e,
                "プッシュ送信の準備に失敗"
            );
            PushError::TransportUnavailable(e.to_string())
        })?;

        // 配信 future を先に確定させ、Send な BoxFuture として並べる
        let pending: Vec<BoxFuture<'_, DeliveryOutcome>> = targets
            .iter()
            .map(|target| self.deliver(target, payload).boxed())
            .collect();
        let outcomes: Vec<DeliveryOutcome> = stream::iter(pending)
            .buffered(self.max_in_flight)
            .collect()
            .await;

        let result = FanoutResult::from_outcomes(outcomes);
        log_business_event!(
            event.category = event::category::PUSH,
            event.action = event::action::PUSH_FANOUT_COMPLETED,
            event.result = event::result::SUCCESS,
            push.sent = result.sent_count,
            push.failed = result.failed_count,
            "プッシュ一斉配信完了"
        );
        Ok(result)
    }

    async fn deliver(&self, target: &PushTarget, payload: &NotificationPayload) -> DeliveryOutcome {
        let send_error = match self.transport.send(&target.token, payload).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::PUSH,
                    event.action = event::action::PUSH_SENT,
                    event.result = event::result::SUCCESS,
                    "プッシュ送信成功"
                );
                return DeliveryOutcome::delivered(target.clone());
            }
            Err(e) => e,
        };

        let outcome = DeliveryOutcome::failed(target.clone(), &send_error);
        log_business_event!(
            event.category = event::category::PUSH,
            event.action = event::action::PUSH_FAILED,
            event.result = event::result::FAILURE,
            push.error_code = %send_error.error_code,
            push.permanent = send_error.permanent,
            error = %send_error,
            "プッシュ送信失敗"
        );

        if outcome.should_invalidate_target {
            match self.store.remove(&target.token).await {
                Ok(()) => log_business_event!(
                    event.category = event::category::PUSH,
                    event.action = event::action::PUSH_TOKEN_INVALIDATED,
                    event.result = event::result::SUCCESS,
                    push.error_code = %send_error.error_code,
                    "無効な配信先トークンを削除"
                ),
                Err(e) => tracing::warn!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::TOKEN_REMOVAL,
                    error = %e,
                    "無効な配信先トークンの削除に失敗"
                ),
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Duration};

    use lightestate_domain::push::{PushSendError, PushToken};
    use lightestate_infra::{
        mock::{MockAccessTokenProvider, MockPushTransport, MockTokenStore},
        push::FcmV1Transport,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn targets(tokens: &[&str]) -> Vec<PushTarget> {
        tokens.iter().map(|t| PushTarget::new(*t)).collect()
    }

    fn payload() -> NotificationPayload {
        NotificationPayload::new("New sale!", "Apt 203 (Torre Sul) sold.")
    }

    fn dispatcher(transport: &MockPushTransport, store: &MockTokenStore) -> PushFanoutDispatcher {
        PushFanoutDispatcher::new(Arc::new(transport.clone()), Arc::new(store.clone()), 4)
    }

    #[tokio::test]
    async fn test_配信先が0件なら外部に触れず空の結果を返す() {
        let transport = MockPushTransport::new();
        transport.fail_prepare("呼ばれてはいけない");
        let store = MockTokenStore::new();

        let result = dispatcher(&transport, &store)
            .dispatch(&[], &payload())
            .await
            .unwrap();

        assert_eq!(result, FanoutResult::empty());
        assert_eq!(transport.prepare_calls(), 0);
        assert!(transport.sent().is_empty());
        assert!(store.removed().is_empty());
    }

    #[tokio::test]
    async fn test_件数の合計は配信先の数と一致する() {
        let transport = MockPushTransport::new();
        transport.fail_token("b", PushSendError::transient("UNAVAILABLE", "retry"));
        transport.fail_token("d", PushSendError::permanent("UNREGISTERED", "gone"));
        let store = MockTokenStore::new();
        let targets = targets(&["a", "b", "c", "d", "e"]);

        let result = dispatcher(&transport, &store)
            .dispatch(&targets, &payload())
            .await
            .unwrap();

        assert_eq!(result.sent_count, 3);
        assert_eq!(result.failed_count, 2);
        assert_eq!(result.sent_count + result.failed_count, targets.len());
        assert_eq!(result.outcomes.len(), targets.len());
    }

    #[tokio::test]
    async fn test_結果は入力した配信先の順序で返る() {
        let transport = MockPushTransport::new();
        transport.fail_token("t3", PushSendError::transient("INTERNAL", ""));
        let store = MockTokenStore::new();
        let tokens: Vec<String> = (0..20).map(|i| format!("t{i}")).collect();
        let targets: Vec<PushTarget> = tokens.iter().map(PushTarget::new).collect();

        let result = dispatcher(&transport, &store)
            .dispatch(&targets, &payload())
            .await
            .unwrap();

        let order: Vec<&PushTarget> = result.outcomes.iter().map(|o| &o.target).collect();
        assert_eq!(order, targets.iter().collect::<Vec<_>>());
        assert!(!result.outcomes[3].succeeded);
    }

    #[tokio::test]
    async fn test_各配信先に1回だけ送信する() {
        let transport = MockPushTransport::new();
        transport.fail_token("b", PushSendError::transient("UNAVAILABLE", ""));
        let store = MockTokenStore::new();

        dispatcher(&transport, &store)
            .dispatch(&targets(&["a", "b", "c"]), &payload())
            .await
            .unwrap();

        let mut sent = transport.sent();
        sent.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        assert_eq!(
            sent,
            vec![PushToken::new("a"), PushToken::new("b"), PushToken::new("c")]
        );
        assert_eq!(transport.prepare_calls(), 1);
    }

    #[tokio::test]
    async fn test_恒久的な失敗の配信先だけを削除する() {
        let transport = MockPushTransport::new();
        transport.fail_token("gone-1", PushSendError::permanent("UNREGISTERED", ""));
        transport.fail_token("flaky", PushSendError::transient("UNAVAILABLE", ""));
        transport.fail_token("gone-2", PushSendError::permanent("NotRegistered", ""));
        let store = MockTokenStore::with_targets(targets(&["ok", "gone-1", "flaky", "gone-2"]));

        let result = dispatcher(&transport, &store)
            .dispatch(&store.targets(), &payload())
            .await
            .unwrap();

        let removed: HashSet<PushToken> = store.removed().into_iter().collect();
        let invalidated: HashSet<PushToken> = result.invalidated_tokens().cloned().collect();
        assert_eq!(
            removed,
            HashSet::from([PushToken::new("gone-1"), PushToken::new("gone-2")])
        );
        assert_eq!(removed, invalidated);
        assert_eq!(store.targets(), targets(&["ok", "flaky"]));
    }

    #[tokio::test]
    async fn test_削除の失敗は配信結果に影響しない() {
        let transport = MockPushTransport::new();
        transport.fail_token("gone", PushSendError::permanent("UNREGISTERED", "gone"));
        let store = MockTokenStore::new();
        store.fail_removal();

        let result = dispatcher(&transport, &store)
            .dispatch(&targets(&["ok", "gone"]), &payload())
            .await
            .unwrap();

        assert_eq!(result.sent_count, 1);
        assert_eq!(result.failed_count, 1);
        let failed = &result.outcomes[1];
        assert!(!failed.succeeded);
        assert!(failed.should_invalidate_target);
        assert_eq!(failed.error_code.as_deref(), Some("UNREGISTERED"));
        assert_eq!(store.removed(), vec![PushToken::new("gone")]);
    }

    #[tokio::test]
    async fn test_準備に失敗したらどの配信先にも送信しない() {
        let transport = MockPushTransport::new();
        transport.fail_prepare("service-account.json が見つかりません");
        let store = MockTokenStore::new();

        let err = dispatcher(&transport, &store)
            .dispatch(&targets(&["a", "b"]), &payload())
            .await
            .unwrap_err();

        assert!(matches!(err, PushError::TransportUnavailable(_)));
        assert!(transport.sent().is_empty());
        assert!(store.removed().is_empty());
    }

    #[tokio::test]
    async fn test_同じ入力の配信は同じ結果になる() {
        let transport = MockPushTransport::new();
        let store = MockTokenStore::new();
        let dispatcher = dispatcher(&transport, &store);
        let targets = targets(&["a", "b", "c"]);

        let first = dispatcher.dispatch(&targets, &payload()).await.unwrap();
        let second = dispatcher.dispatch(&targets, &payload()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.sent_count, 3);
    }

    #[tokio::test]
    async fn test_同時送信数0は1として扱う() {
        let transport = MockPushTransport::new();
        let store = MockTokenStore::new();
        let dispatcher =
            PushFanoutDispatcher::new(Arc::new(transport.clone()), Arc::new(store), 0);

        let result = dispatcher
            .dispatch(&targets(&["a", "b"]), &payload())
            .await
            .unwrap();

        assert_eq!(result.sent_count, 2);
    }

    #[tokio::test]
    async fn test_送信が逆順に完了しても結果は入力順で返る() {
        let transport = MockPushTransport::new();
        transport.delay_token("0", Duration::from_millis(150));
        transport.delay_token("1", Duration::from_millis(100));
        transport.delay_token("2", Duration::from_millis(50));
        transport.fail_token("1", PushSendError::permanent("UNREGISTERED", "gone"));
        let store = MockTokenStore::new();

        let result = dispatcher(&transport, &store)
            .dispatch(&targets(&["0", "1", "2"]), &payload())
            .await
            .unwrap();

        // 送信は並行に走り、後の配信先から先に完了する
        assert_eq!(
            transport.sent(),
            vec![PushToken::new("2"), PushToken::new("1"), PushToken::new("0")]
        );
        let order: Vec<&str> = result
            .outcomes
            .iter()
            .map(|o| o.target.token.as_str())
            .collect();
        assert_eq!(order, vec!["0", "1", "2"]);
        assert_eq!(result.sent_count, 2);
        assert_eq!(result.failed_count, 1);
        assert!(result.outcomes[1].should_invalidate_target);
        assert_eq!(store.removed(), vec![PushToken::new("1")]);
    }

    #[tokio::test]
    async fn test_dispatchは別タスクで実行できる() {
        let transport = MockPushTransport::new();
        let store = MockTokenStore::new();
        let dispatcher = Arc::new(dispatcher(&transport, &store));

        // tokio::spawn は Send な future しか受け付けない
        let handle = tokio::spawn(async move {
            let targets = targets(&["a", "b"]);
            let payload = payload();
            dispatcher.dispatch(&targets, &payload).await
        });
        let result = handle.await.unwrap().unwrap();

        assert_eq!(result.sent_count, 2);
    }

    #[tokio::test]
    async fn test_アクセストークンを取得できなければ配信基盤は利用できない() {
        let tokens = MockAccessTokenProvider::failing();
        let transport = FcmV1Transport::new("light-estate", Arc::new(tokens.clone()));
        let store = MockTokenStore::new();
        let dispatcher =
            PushFanoutDispatcher::new(Arc::new(transport), Arc::new(store.clone()), 4);

        let err = dispatcher
            .dispatch(&targets(&["a", "b"]), &payload())
            .await
            .unwrap_err();

        assert!(matches!(err, PushError::TransportUnavailable(_)));
        // prepare で 1 回だけ呼ばれ、送信には進まない
        assert_eq!(tokens.calls(), 1);
        assert!(store.removed().is_empty());
    }
}
