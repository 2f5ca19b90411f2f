//! # 申告ユースケース
//!
//! 申告（furnish）の受付・却下・承認パイプラインを実装する。
//!
//! ## Result モデル
//!
//! 各パイプラインは例外ベースの制御フローではなく、閉じた 4 バリアントの
//! タグ付き Result（Success / ValidationError / BusinessError /
//! TechnicalError）を返す。期待される失敗は「返され」、予期しない失敗だけが
//! パイプライン内部で `CoreError` として送出され、各サービスのトップレベルで
//! 一度だけ TechnicalError バリアントに変換される。
//!
//! 呼び出し側は 4 バリアントすべてを網羅的に処理しなければならない。
//! 暗黙の第 5 のケースは存在しない。

mod approval;
mod audit;
mod context;
mod persistence;
mod rejection;
mod submission;
mod validator;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use noticeflow_domain::furnish::{FurnishApplication, RejectionReasonCode};

pub use approval::FurnishApprovalService;
pub use audit::FurnishAuditService;
pub use context::{FailedCheck, FurnishContext, ParsedFurnishRequest};
pub use persistence::FurnishPersistenceService;
pub use rejection::FurnishRejectionService;
pub use submission::FurnishSubmissionService;
pub use validator::{BasicRuleViolation, FurnishValidator};

// =========================================================================
// 入力
// =========================================================================

/// 郵送先住所の入力
#[derive(Clone)]
pub struct MailingAddressInput {
    pub block_no:      String,
    pub street_name:   String,
    pub floor_no:      Option<String>,
    pub unit_no:       Option<String>,
    pub building_name: Option<String>,
    pub postal_code:   String,
}

/// 添付書類参照の入力
#[derive(Clone)]
pub struct DocumentRefInput {
    pub reference: String,
    pub file_name: String,
}

/// 申告受付の入力
///
/// eService から受け取った生のフォーム値。構造検証は
/// [`FurnishValidator::validate_basic_business_rules`] がパイプライン内で行う。
/// PII（氏名・ID 番号）を含むため `Debug` は実装しない。
#[derive(Clone)]
pub struct SubmissionInput {
    pub notice_no: String,
    pub vehicle_no: String,
    pub furnish_name: String,
    pub furnish_id_type: String,
    pub furnish_id_no: String,
    pub owner_driver_indicator: String,
    pub hirer_owner_relationship: Option<String>,
    pub mailing_address: MailingAddressInput,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub question_1: String,
    pub question_2: String,
    pub question_3: String,
    pub rental_start: Option<NaiveDate>,
    pub rental_end: Option<NaiveDate>,
    pub document_refs: Vec<DocumentRefInput>,
}

/// 審査担当官による却下の入力
#[derive(Clone)]
pub struct RejectionInput {
    pub txn_no: String,
    pub officer_id: String,
    pub reason_code: RejectionReasonCode,
    pub remarks: Option<String>,
    pub send_email_to_owner: bool,
    pub email_template_id: Option<String>,
}

/// 審査担当官による承認の入力
#[derive(Clone)]
pub struct ApprovalInput {
    pub txn_no:     String,
    pub officer_id: String,
    pub remarks:    Option<String>,
}

// =========================================================================
// Result（閉じた 4 バリアント）
// =========================================================================

/// 申告受付パイプラインの結果
pub enum SubmissionResult {
    /// 受付完了（自動承認 or 審査待ち確定の成功はこのバリアント）
    Success {
        application: FurnishApplication,
        auto_approved: bool,
        hirer_driver_record_created: bool,
        suspension_applied: bool,
        message: String,
    },
    /// 入力不正・参照不整合（永続化は一切行われていない）
    ValidationError {
        field:      Option<String>,
        message:    String,
        violations: Vec<String>,
    },
    /// 業務ルール違反（申請行は作成済み。`application` で txn_no を参照できる）
    BusinessError {
        check_type: String,
        message: String,
        requires_manual_review: bool,
        application: Option<FurnishApplication>,
    },
    /// インフラ・予期しない失敗（リクエスト全体の再試行が安全）
    TechnicalError {
        operation: String,
        message:   String,
        cause:     String,
        details:   BTreeMap<String, String>,
    },
}

/// 却下パイプラインの結果
pub enum RejectionResult {
    /// 却下完了（副作用フラグ付き）
    Success {
        application: FurnishApplication,
        email_sent_to_owner: bool,
        notice_resent_to_portal: bool,
        message: String,
    },
    /// 入力不正（txn_no 不明など）
    ValidationError {
        field:   Option<String>,
        message: String,
    },
    /// 不正な状態遷移（ALREADY_APPROVED / ALREADY_REJECTED）
    BusinessError { reason: String, message: String },
    /// インフラ・予期しない失敗
    TechnicalError {
        operation: String,
        message:   String,
        cause:     String,
        details:   BTreeMap<String, String>,
    },
}

/// 承認パイプラインの結果
pub enum ApprovalResult {
    /// 承認完了（副作用フラグ付き）
    Success {
        application: FurnishApplication,
        hirer_driver_record_created: bool,
        suspension_revived: bool,
        message: String,
    },
    /// 入力不正（txn_no 不明など）
    ValidationError {
        field:   Option<String>,
        message: String,
    },
    /// 不正な状態遷移（ALREADY_APPROVED / ALREADY_REJECTED）
    BusinessError { reason: String, message: String },
    /// インフラ・予期しない失敗
    TechnicalError {
        operation: String,
        message:   String,
        cause:     String,
        details:   BTreeMap<String, String>,
    },
}
