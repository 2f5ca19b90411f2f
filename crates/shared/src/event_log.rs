//! # ビジネスイベントログの構造化ヘルパー
//!
//! 監査ログを `jq` で効率的に調査できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! 申告パイプラインの各ステップは 1 イベントずつ順に出力するため、
//! 同一 `event.entity_id`（txn_no）のイベント列からパイプラインの進行が再構成できる。
//! 「application_created はあるが suspension_applied がない」といった欠落は
//! 部分失敗の検出シグナルとして扱う。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`event.action`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID（txn_no / notice_no）
/// - `event.actor_id`: 操作者 ID（審査担当官 ID）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const FURNISH: &str = "furnish";
        pub const NOTIFICATION: &str = "notification";
        pub const PORTAL: &str = "portal";
    }

    /// イベントアクション
    pub mod action {
        // 申告パイプライン
        pub const SUBMISSION_RECEIVED: &str = "furnish.submission_received";
        pub const VALIDATION_FAILED: &str = "furnish.validation_failed";
        pub const APPLICATION_CREATED: &str = "furnish.application_created";
        pub const DOCUMENTS_ATTACHED: &str = "furnish.documents_attached";
        pub const HIRER_DRIVER_CREATED: &str = "furnish.hirer_driver_created";
        pub const SUSPENSION_APPLIED: &str = "furnish.suspension_applied";
        pub const SUSPENSION_REVIVED: &str = "furnish.suspension_revived";
        pub const AUTO_APPROVED: &str = "furnish.auto_approved";
        pub const MANUAL_REVIEW_REQUIRED: &str = "furnish.manual_review_required";

        // 審査担当官の処分
        pub const APPLICATION_APPROVED: &str = "furnish.application_approved";
        pub const APPLICATION_REJECTED: &str = "furnish.application_rejected";

        // 技術エラー
        pub const TECHNICAL_ERROR: &str = "furnish.technical_error";

        // 通知・ポータル連携
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
        pub const NOTICE_RESENT_TO_PORTAL: &str = "portal.notice_resent";
        pub const PORTAL_RESEND_FAILED: &str = "portal.resend_failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const FURNISH_APPLICATION: &str = "furnish_application";
        pub const NOTICE: &str = "notice";
        pub const OWNER_DRIVER: &str = "owner_driver";
        pub const SUSPENSION: &str = "suspension";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}
