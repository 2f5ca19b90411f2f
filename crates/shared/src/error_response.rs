//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービス側の責務（shared に axum 依存を入れない）
//! - クライアントは HTTP ステータスではなく `error_type` で分岐する

use serde::{Deserialize, Serialize};

/// エラーレスポンス
///
/// 審査ダッシュボード・eService 双方のクライアントが共通で受け取る形式。
/// `success` は常に `false`、`error_type` が機械可読な判別子となる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success:    bool,
    pub error_type: String,
    pub message:    String,
    pub status:     u16,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    pub fn new(error_type: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_type: error_type.into(),
            message: message.into(),
            status,
        }
    }

    /// 400 Validation Error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", 400, message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", 404, message)
    }

    /// 409 Conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", 409, message)
    }

    /// 500 Technical Error
    ///
    /// message は固定値（内部情報を漏らさないため）。
    pub fn technical_error() -> Self {
        Self::new("TECHNICAL_ERROR", 500, "内部エラーが発生しました")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_で全フィールドが正しく設定される() {
        let error = ErrorResponse::new("CUSTOM_ERROR", 418, "カスタムエラー");

        assert!(!error.success);
        assert_eq!(error.error_type, "CUSTOM_ERROR");
        assert_eq!(error.status, 418);
        assert_eq!(error.message, "カスタムエラー");
    }

    #[test]
    fn test_not_found_が404と正しいerror_typeを返す() {
        let error = ErrorResponse::not_found("申告が見つかりません");

        assert_eq!(error.error_type, "NOT_FOUND");
        assert_eq!(error.status, 404);
        assert_eq!(error.message, "申告が見つかりません");
    }

    #[test]
    fn test_technical_error_が500と固定messageを返す() {
        let error = ErrorResponse::technical_error();

        assert_eq!(error.error_type, "TECHNICAL_ERROR");
        assert_eq!(error.status, 500);
        assert_eq!(error.message, "内部エラーが発生しました");
    }

    #[test]
    fn test_jsonシリアライズにsuccessフラグが含まれる() {
        let error = ErrorResponse::validation_error("不正なリクエスト");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error_type"], "VALIDATION_ERROR");
        assert_eq!(json["status"], 400);
        assert_eq!(json["message"], "不正なリクエスト");
    }

    #[test]
    fn test_全便利コンストラクタのstatusが正しい() {
        assert_eq!(ErrorResponse::validation_error("").status, 400);
        assert_eq!(ErrorResponse::not_found("").status, 404);
        assert_eq!(ErrorResponse::conflict("").status, 409);
        assert_eq!(ErrorResponse::technical_error().status, 500);
    }
}
