//! # Furnish Service エラー定義
//!
//! Furnish Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! 申告受付・却下・承認の各パイプラインは期待される失敗（検証エラー・
//! 業務エラー）をタグ付き Result バリアントとして「返し」、
//! この `CoreError` はパイプライン内部の「送出」チャネルとして使用する。
//! 各パイプラインのトップレベルで一度だけ TechnicalError バリアントに
//! 変換される。ダッシュボード系の読み取りエンドポイントはこの型を
//! そのまま HTTP レスポンスに変換する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use noticeflow_shared::ErrorResponse;
use thiserror::Error;

/// Furnish Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 競合（楽観的ロック失敗）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] noticeflow_infra::InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl CoreError {
    /// TechnicalError の `cause` に載せるエラー種別名を返す
    pub fn cause_name(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "NotFound",
            CoreError::BadRequest(_) => "BadRequest",
            CoreError::Conflict(_) => "Conflict",
            CoreError::Database(_) => "InfraError",
            CoreError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::not_found(msg)),
            CoreError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::validation_error(msg))
            }
            CoreError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::conflict(msg)),
            CoreError::Database(e) => {
                tracing::error!("データベースエラー: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::technical_error(),
                )
            }
            CoreError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::technical_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
