//! # FurnishAuditService（パイプライン監査イベント）
//!
//! 申告パイプラインの各ステップを構造化ビジネスイベントとして出力する。
//! イベントは外部のログ基盤が消費する。同一 txn_no のイベント列に
//! 欠落があれば部分失敗の検出シグナルとなる
//! （例: application_created はあるが suspension_applied がない）。

use noticeflow_shared::{event_log::event, log_business_event};

/// 申告パイプラインの監査イベント出力
#[derive(Default)]
pub struct FurnishAuditService;

impl FurnishAuditService {
    pub fn new() -> Self {
        Self
    }

    /// 申告受付開始
    pub fn submission_received(&self, notice_no: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::SUBMISSION_RECEIVED,
            event.entity_type = event::entity_type::NOTICE,
            event.entity_id = notice_no,
            event.result = event::result::SUCCESS,
            "申告を受け付けました"
        );
    }

    /// 基本ビジネスルール検証の失敗
    pub fn validation_failed(&self, notice_no: &str, field: &str, message: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::VALIDATION_FAILED,
            event.entity_type = event::entity_type::NOTICE,
            event.entity_id = notice_no,
            event.result = event::result::FAILURE,
            furnish.field = field,
            furnish.reason = message,
            "基本ビジネスルール検証に失敗しました"
        );
    }

    /// 申請行の作成
    pub fn application_created(&self, txn_no: &str, notice_no: &str, status: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::APPLICATION_CREATED,
            event.entity_type = event::entity_type::FURNISH_APPLICATION,
            event.entity_id = txn_no,
            event.result = event::result::SUCCESS,
            furnish.notice_no = notice_no,
            furnish.status = status,
            "申告申請を作成しました"
        );
    }

    /// 添付書類リンクの作成
    pub fn documents_attached(&self, txn_no: &str, count: usize) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::DOCUMENTS_ATTACHED,
            event.entity_type = event::entity_type::FURNISH_APPLICATION,
            event.entity_id = txn_no,
            event.result = event::result::SUCCESS,
            furnish.document_count = count,
            "添付書類リンクを作成しました"
        );
    }

    /// 名宛人レコードの作成・更新
    pub fn hirer_driver_created(&self, notice_no: &str, indicator: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::HIRER_DRIVER_CREATED,
            event.entity_type = event::entity_type::OWNER_DRIVER,
            event.entity_id = notice_no,
            event.result = event::result::SUCCESS,
            furnish.indicator = indicator,
            "名宛人レコードを作成しました"
        );
    }

    /// TS-PDP サスペンションの適用
    pub fn suspension_applied(&self, notice_no: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::SUSPENSION_APPLIED,
            event.entity_type = event::entity_type::SUSPENSION,
            event.entity_id = notice_no,
            event.result = event::result::SUCCESS,
            "TS-PDP サスペンションを適用しました"
        );
    }

    /// TS-PDP サスペンションの解除（承認時のみ）
    pub fn suspension_revived(&self, notice_no: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::SUSPENSION_REVIVED,
            event.entity_type = event::entity_type::SUSPENSION,
            event.entity_id = notice_no,
            event.result = event::result::SUCCESS,
            "TS-PDP サスペンションを解除しました"
        );
    }

    /// 自動承認の成立
    pub fn auto_approved(&self, txn_no: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::AUTO_APPROVED,
            event.entity_type = event::entity_type::FURNISH_APPLICATION,
            event.entity_id = txn_no,
            event.result = event::result::SUCCESS,
            "申告を自動承認しました"
        );
    }

    /// 手動審査行き（不合格理由の全件を添付）
    pub fn manual_review_required(&self, txn_no: &str, reasons: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::MANUAL_REVIEW_REQUIRED,
            event.entity_type = event::entity_type::FURNISH_APPLICATION,
            event.entity_id = txn_no,
            event.result = event::result::FAILURE,
            furnish.failed_checks = reasons,
            "自動承認チェックに不合格のため手動審査に回します"
        );
    }

    /// 審査担当官による承認
    pub fn application_approved(&self, txn_no: &str, officer_id: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::APPLICATION_APPROVED,
            event.entity_type = event::entity_type::FURNISH_APPLICATION,
            event.entity_id = txn_no,
            event.actor_id = officer_id,
            event.result = event::result::SUCCESS,
            "申告を承認しました"
        );
    }

    /// 審査担当官による却下
    pub fn application_rejected(&self, txn_no: &str, officer_id: &str, reason_code: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::APPLICATION_REJECTED,
            event.entity_type = event::entity_type::FURNISH_APPLICATION,
            event.entity_id = txn_no,
            event.actor_id = officer_id,
            event.result = event::result::SUCCESS,
            furnish.reason_code = reason_code,
            "申告を却下しました"
        );
    }

    /// ポータルへの再掲載シグナル送信の結果
    pub fn notice_resent_to_portal(&self, notice_no: &str, success: bool) {
        if success {
            log_business_event!(
                event.category = event::category::PORTAL,
                event.action = event::action::NOTICE_RESENT_TO_PORTAL,
                event.entity_type = event::entity_type::NOTICE,
                event.entity_id = notice_no,
                event.result = event::result::SUCCESS,
                "通知書をポータルに再掲載しました"
            );
        } else {
            log_business_event!(
                event.category = event::category::PORTAL,
                event.action = event::action::PORTAL_RESEND_FAILED,
                event.entity_type = event::entity_type::NOTICE,
                event.entity_id = notice_no,
                event.result = event::result::FAILURE,
                "ポータルへの再掲載に失敗しました"
            );
        }
    }

    /// 予期しない技術エラー
    pub fn technical_error(&self, operation: &str, message: &str) {
        log_business_event!(
            event.category = event::category::FURNISH,
            event.action = event::action::TECHNICAL_ERROR,
            event.entity_type = event::entity_type::FURNISH_APPLICATION,
            event.result = event::result::FAILURE,
            furnish.operation = operation,
            furnish.reason = message,
            "パイプラインで予期しないエラーが発生しました"
        );
    }
}
