//! 外部サービスレスポンスの共通ハンドリング

use crate::error::InfraError;

/// 成功ステータスでなければ [`InfraError::upstream`] に変換する
///
/// エラー時のボディは `detail` として利用者に返せるよう、そのまま保持する。
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, InfraError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(InfraError::upstream(service, status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InfraErrorKind;

    fn make_response(status: u16, body: &str) -> reqwest::Response {
        let http_resp = http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body.to_string())
            .unwrap();
        reqwest::Response::from(http_resp)
    }

    #[tokio::test]
    async fn test_成功レスポンスはそのまま返す() {
        let response = make_response(200, "[]");
        let response = ensure_success("supabase", response).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_失敗レスポンスはupstreamエラーになる() {
        let response = make_response(401, r#"{"message":"Invalid API key"}"#);

        let err = ensure_success("supabase", response).await.unwrap_err();

        match err.kind() {
            InfraErrorKind::Upstream {
                service,
                status,
                body,
            } => {
                assert_eq!(*service, "supabase");
                assert_eq!(*status, 401);
                assert_eq!(body, r#"{"message":"Invalid API key"}"#);
            }
            other => panic!("Upstream であること: {other:?}"),
        }
    }
}
