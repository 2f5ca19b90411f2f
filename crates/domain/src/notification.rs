//! # 通知
//!
//! メール通知に関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **閉集合のテンプレート種別**: クライアント指定のテンプレート ID は
//!   [`RejectionTemplateType::from_client_id`] で閉集合にマッピングし、
//!   未知の ID は汎用テンプレートにフォールバックする
//! - **fire-and-forget**: 通知送信の失敗は却下処理の完了に影響しない
//! - **テンプレート分離**: 通知イベントとメール生成は分離
//!   （TemplateRenderer は furnish-service 側）

use chrono::{DateTime, Utc};
use thiserror::Error;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 却下メールのテンプレート種別
///
/// 審査担当官クライアントはテンプレート ID 文字列を送信し、
/// サーバ側でこの閉集合にマッピングする。未知の ID は `Generic` になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionTemplateType {
    /// 標準の却下通知
    Standard,
    /// 再申告を促す却下通知
    ResubmissionRequired,
    /// 汎用テンプレート（フォールバック）
    Generic,
}

impl RejectionTemplateType {
    /// クライアント指定のテンプレート ID からテンプレート種別を解決する
    ///
    /// ID 未指定・未知の ID は `Generic` にフォールバックする（純関数）。
    pub fn from_client_id(client_id: Option<&str>) -> Self {
        match client_id {
            Some("REJ-STD") => Self::Standard,
            Some("REJ-RESUBMIT") => Self::ResubmissionRequired,
            _ => Self::Generic,
        }
    }

    /// テンプレートファイルのベース名を返す
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Standard => "rejection_standard",
            Self::ResubmissionRequired => "rejection_resubmission",
            Self::Generic => "rejection_generic",
        }
    }
}

/// 却下メールの本文生成に使用する詳細ビュー
///
/// テンプレートに渡す値の集約。PII を含むため、そのままログ出力しないこと。
#[derive(Debug, Clone)]
pub struct RejectionEmailView {
    pub notice_no:       String,
    pub txn_no:          String,
    pub vehicle_no:      String,
    pub reason:          String,
    pub officer_remarks: Option<String>,
    pub rejected_at:     DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_テンプレートidの解決_標準() {
        assert_eq!(
            RejectionTemplateType::from_client_id(Some("REJ-STD")),
            RejectionTemplateType::Standard
        );
    }

    #[test]
    fn test_テンプレートidの解決_再申告() {
        assert_eq!(
            RejectionTemplateType::from_client_id(Some("REJ-RESUBMIT")),
            RejectionTemplateType::ResubmissionRequired
        );
    }

    #[test]
    fn test_未知のテンプレートidは汎用にフォールバックする() {
        assert_eq!(
            RejectionTemplateType::from_client_id(Some("REJ-UNKNOWN")),
            RejectionTemplateType::Generic
        );
        assert_eq!(
            RejectionTemplateType::from_client_id(None),
            RejectionTemplateType::Generic
        );
    }

    #[test]
    fn test_テンプレート名の対応() {
        assert_eq!(
            RejectionTemplateType::Standard.template_name(),
            "rejection_standard"
        );
        assert_eq!(
            RejectionTemplateType::ResubmissionRequired.template_name(),
            "rejection_resubmission"
        );
        assert_eq!(
            RejectionTemplateType::Generic.template_name(),
            "rejection_generic"
        );
    }
}
