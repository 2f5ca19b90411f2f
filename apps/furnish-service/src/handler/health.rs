//! ヘルスチェックハンドラ

use axum::Json;
use noticeflow_shared::HealthResponse;

/// ヘルスチェック
///
/// ## エンドポイント
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_checkはhealthyを返す() {
        let response = health_check().await;
        assert_eq!(response.0.status, "healthy");
    }
}
