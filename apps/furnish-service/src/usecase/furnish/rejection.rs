//! # FurnishRejectionService（審査担当官による却下）
//!
//! 状態遷移ガード付きの却下パイプライン。
//!
//! ## 処理フロー
//!
//! 1. txn_no で申請を取得（不在なら ValidationError）
//! 2. 状態機械ガード（承認済み → ALREADY_APPROVED、却下済み → ALREADY_REJECTED。
//!    いずれも BusinessError であり、暗黙の no-op にはしない）
//! 3. オプトイン時は所有者へ却下メール送信（失敗しても却下は中断しない）
//! 4. status = R へ遷移し、整形した備考を追記して永続化
//! 5. eService ポータルへ再申告受付シグナル（失敗は非致命）
//! 6. 副作用フラグ付きで Success を返す
//!
//! TS-PDP サスペンションは意図的に解除しない。通知書は停止されたまま残り、
//! 所有者は処理時計と競合せずに再申告できる。

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use noticeflow_domain::{
    clock::Clock,
    furnish::{FurnishApplication, FurnishStatus},
    notification::{RejectionEmailView, RejectionTemplateType},
    value_objects::TxnNo,
};
use noticeflow_infra::{
    db::TransactionManager,
    portal::EservicePortalClient,
    repository::{FurnishApplicationRepository, NoticeRepository},
};

use super::{FurnishAuditService, FurnishPersistenceService, RejectionInput, RejectionResult};
use crate::{error::CoreError, usecase::notification::NotificationService};

/// 却下パイプラインのオーケストレータ
pub struct FurnishRejectionService {
    application_repo: Arc<dyn FurnishApplicationRepository>,
    notice_repo: Arc<dyn NoticeRepository>,
    persistence: FurnishPersistenceService,
    notification: NotificationService,
    portal: Arc<dyn EservicePortalClient>,
    tx_manager: Arc<dyn TransactionManager>,
    clock: Arc<dyn Clock>,
    audit: FurnishAuditService,
}

impl FurnishRejectionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        application_repo: Arc<dyn FurnishApplicationRepository>,
        notice_repo: Arc<dyn NoticeRepository>,
        persistence: FurnishPersistenceService,
        notification: NotificationService,
        portal: Arc<dyn EservicePortalClient>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            application_repo,
            notice_repo,
            persistence,
            notification,
            portal,
            tx_manager,
            clock,
            audit: FurnishAuditService::new(),
        }
    }

    /// 申告を却下する
    ///
    /// 予期しない例外はここで一度だけ TechnicalError に変換する。
    pub async fn reject_furnish(&self, input: RejectionInput) -> RejectionResult {
        let txn_no_for_details = input.txn_no.trim().to_string();
        match self.run_pipeline(input).await {
            Ok(result) => result,
            Err(e) => {
                self.audit.technical_error("reject_furnish", &e.to_string());
                let mut details = BTreeMap::new();
                details.insert("txn_no".to_string(), txn_no_for_details);
                RejectionResult::TechnicalError {
                    operation: "reject_furnish".to_string(),
                    message:   e.to_string(),
                    cause:     e.cause_name().to_string(),
                    details,
                }
            }
        }
    }

    async fn run_pipeline(&self, input: RejectionInput) -> Result<RejectionResult, CoreError> {
        // 1. txn_no で申請を取得
        let Ok(txn_no) = TxnNo::new(input.txn_no.clone()) else {
            return Ok(RejectionResult::ValidationError {
                field:   Some("txn_no".to_string()),
                message: "トランザクション番号が不正です".to_string(),
            });
        };
        let Some(application) = self.application_repo.find_by_txn_no(&txn_no).await? else {
            return Ok(RejectionResult::ValidationError {
                field:   Some("txn_no".to_string()),
                message: format!("申告申請が見つかりません: {}", txn_no),
            });
        };

        // 2. 状態機械ガード（承認済み申告は不変。却下済みの再却下は競合として報告）
        match application.status() {
            FurnishStatus::Approved => {
                return Ok(RejectionResult::BusinessError {
                    reason:  "ALREADY_APPROVED".to_string(),
                    message: "承認済みの申告は変更できません".to_string(),
                });
            }
            FurnishStatus::Rejected => {
                return Ok(RejectionResult::BusinessError {
                    reason:  "ALREADY_REJECTED".to_string(),
                    message: "既に却下済みの申告です".to_string(),
                });
            }
            FurnishStatus::Pending => {}
        }

        let now = self.clock.now();

        // 3. 所有者への却下メール（オプトイン。失敗は email_sent_to_owner=false として報告）
        let email_sent_to_owner = if input.send_email_to_owner {
            self.send_rejection_email(&application, &input, now).await
        } else {
            false
        };

        // 4. status = R へ遷移し、備考を追記して永続化（上書きではなく追記）
        let expected_version = application.version();
        let remark = format_rejection_remark(&input, now);
        let rejected = application
            .rejected(now)
            .map_err(|e| CoreError::Internal(format!("却下遷移に失敗: {}", e)))?
            .with_appended_remark(&remark, now);

        let mut tx = self.tx_manager.begin().await?;
        self.persistence
            .update_application(&rejected, expected_version, &mut tx)
            .await?;
        tx.commit().await?;

        let reason_code: &str = input.reason_code.into();
        self.audit
            .application_rejected(rejected.txn_no().as_str(), &input.officer_id, reason_code);

        // 5. eService ポータルへ再申告受付シグナル（失敗は非致命）
        let notice_resent_to_portal = match self
            .portal
            .resend_notice_to_portal(rejected.notice_no())
            .await
        {
            Ok(()) => {
                self.audit
                    .notice_resent_to_portal(rejected.notice_no().as_str(), true);
                true
            }
            Err(e) => {
                tracing::warn!(
                    notice_no = %rejected.notice_no(),
                    error = %e,
                    "ポータルへの再掲載に失敗しました（却下は完了済み）"
                );
                self.audit
                    .notice_resent_to_portal(rejected.notice_no().as_str(), false);
                false
            }
        };

        // 6. TS-PDP サスペンションは解除せずそのまま残す（再申告を受け付けるため）
        Ok(RejectionResult::Success {
            application: rejected,
            email_sent_to_owner,
            notice_resent_to_portal,
            message: "申告を却下しました".to_string(),
        })
    }

    /// 所有者への却下メールを送信する
    ///
    /// 所有者のメールアドレスは通知書から解決する。未登録・送信失敗の
    /// いずれも false を返すだけで、却下処理は続行される。
    async fn send_rejection_email(
        &self,
        application: &FurnishApplication,
        input: &RejectionInput,
        now: DateTime<Utc>,
    ) -> bool {
        let owner_email = match self.notice_repo.find_by_no(application.notice_no()).await {
            Ok(Some(notice)) => notice.owner_email().map(str::to_string),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    notice_no = %application.notice_no(),
                    error = %e,
                    "所有者メールアドレスの解決に失敗しました"
                );
                None
            }
        };
        let Some(to) = owner_email else {
            tracing::info!(
                notice_no = %application.notice_no(),
                "所有者メールアドレス未登録のため却下メールをスキップします"
            );
            return false;
        };

        // クライアント指定のテンプレート ID を閉集合に解決（未知 ID は汎用）
        let template = RejectionTemplateType::from_client_id(input.email_template_id.as_deref());
        let view = RejectionEmailView {
            notice_no:       application.notice_no().to_string(),
            txn_no:          application.txn_no().to_string(),
            vehicle_no:      application.vehicle_no().to_string(),
            reason:          input.reason_code.to_string(),
            officer_remarks: input.remarks.clone(),
            rejected_at:     now,
        };

        self.notification
            .send_and_record_rejection_email(&view, template, &input.officer_id, &to)
            .await
    }
}

/// 却下の備考追記行を整形する
///
/// 形式: `[担当官ID] UTC時刻 REJECTED 理由コード: 自由記述`
fn format_rejection_remark(input: &RejectionInput, now: DateTime<Utc>) -> String {
    let reason_code: &str = input.reason_code.into();
    match input.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(text) => format!(
            "[{}] {} REJECTED {}: {}",
            input.officer_id,
            now.to_rfc3339(),
            reason_code,
            text.trim()
        ),
        None => format!(
            "[{}] {} REJECTED {}",
            input.officer_id,
            now.to_rfc3339(),
            reason_code
        ),
    }
}

#[cfg(test)]
mod tests {
    use noticeflow_domain::furnish::{
        FurnishStatus,
        RejectionReasonCode,
        SuspensionType,
    };
    use noticeflow_domain::notice::NoticeProcessingStage;
    use noticeflow_infra::repository::SuspensionRepository;
    use pretty_assertions::assert_eq;

    use super::super::test_helpers::{
        MockSet,
        build_rejection_service,
        fixed_now,
        make_notice,
        make_notice_without_owner_email,
        make_pending_application,
        notice_no,
    };
    use super::*;

    fn make_rejection_input(txn_no: &str) -> RejectionInput {
        RejectionInput {
            txn_no: txn_no.to_string(),
            officer_id: "OFF-042".to_string(),
            reason_code: RejectionReasonCode::InvalidParticulars,
            remarks: Some("契約書の記載と申告内容が一致しない".to_string()),
            send_email_to_owner: false,
            email_template_id: None,
        }
    }

    #[tokio::test]
    async fn test_reject_furnish_正常系() {
        // Arrange
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Suspended));
        let application = make_pending_application("FRN-TEST-0001");
        mocks.application_repo.add_application(application.clone());
        let sut = build_rejection_service(&mocks);

        // Act
        let result = sut.reject_furnish(make_rejection_input("FRN-TEST-0001")).await;

        // Assert
        let RejectionResult::Success {
            application: rejected,
            notice_resent_to_portal,
            ..
        } = result
        else {
            panic!("Success を期待");
        };
        assert_eq!(rejected.status(), FurnishStatus::Rejected);
        assert!(notice_resent_to_portal);

        // 備考が追記されている（担当官 ID・理由コード・自由記述）
        assert!(rejected.remarks().contains("[OFF-042]"));
        assert!(rejected.remarks().contains("INVALID_PARTICULARS"));
        assert!(rejected.remarks().contains("契約書の記載"));

        // 永続化済み
        let stored = mocks.application_repo.applications();
        assert_eq!(stored[0].status(), FurnishStatus::Rejected);

        // ポータルが呼ばれている
        assert_eq!(mocks.portal.calls(), vec!["N2024-000123".to_string()]);
    }

    #[tokio::test]
    async fn test_reject_furnish_承認済みはbusiness_error() {
        // Arrange
        let mocks = MockSet::new();
        let application = make_pending_application("FRN-TEST-0001")
            .approved(fixed_now())
            .unwrap();
        let remarks_before = application.remarks().to_string();
        mocks.application_repo.add_application(application);
        let sut = build_rejection_service(&mocks);

        // Act
        let result = sut.reject_furnish(make_rejection_input("FRN-TEST-0001")).await;

        // Assert
        let RejectionResult::BusinessError { reason, .. } = result else {
            panic!("BusinessError を期待");
        };
        assert_eq!(reason, "ALREADY_APPROVED");

        // 行は一切変更されない（備考も不変）
        let stored = mocks.application_repo.applications();
        assert_eq!(stored[0].status(), FurnishStatus::Approved);
        assert_eq!(stored[0].remarks(), remarks_before);
    }

    #[tokio::test]
    async fn test_reject_furnish_却下済みの再却下はbusiness_error() {
        // Arrange: 再却下は冪等成功ではなく競合として報告する
        let mocks = MockSet::new();
        let application = make_pending_application("FRN-TEST-0001")
            .rejected(fixed_now())
            .unwrap();
        mocks.application_repo.add_application(application);
        let sut = build_rejection_service(&mocks);

        // Act
        let result = sut.reject_furnish(make_rejection_input("FRN-TEST-0001")).await;

        // Assert
        let RejectionResult::BusinessError { reason, .. } = result else {
            panic!("BusinessError を期待");
        };
        assert_eq!(reason, "ALREADY_REJECTED");
    }

    #[tokio::test]
    async fn test_reject_furnish_txn_no不明はvalidation_error() {
        let mocks = MockSet::new();
        let sut = build_rejection_service(&mocks);

        let result = sut.reject_furnish(make_rejection_input("FRN-UNKNOWN")).await;

        let RejectionResult::ValidationError { field, .. } = result else {
            panic!("ValidationError を期待");
        };
        assert_eq!(field.as_deref(), Some("txn_no"));
    }

    #[tokio::test]
    async fn test_reject_furnish_メール希望だが所有者メール未登録でも成功() {
        // Arrange: 所有者メールアドレスなしの通知書
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice_without_owner_email(
                NoticeProcessingStage::Suspended,
            ));
        mocks
            .application_repo
            .add_application(make_pending_application("FRN-TEST-0001"));
        let sut = build_rejection_service(&mocks);

        let mut input = make_rejection_input("FRN-TEST-0001");
        input.send_email_to_owner = true;

        // Act
        let result = sut.reject_furnish(input).await;

        // Assert: email_sent_to_owner=false のまま status は R に遷移する
        let RejectionResult::Success {
            application,
            email_sent_to_owner,
            ..
        } = result
        else {
            panic!("Success を期待");
        };
        assert!(!email_sent_to_owner);
        assert_eq!(application.status(), FurnishStatus::Rejected);
    }

    #[tokio::test]
    async fn test_reject_furnish_メール送信失敗でも却下は完了する() {
        // Arrange: 送信が常に失敗するモック
        let mocks = MockSet::with_failing_sender();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Suspended));
        mocks
            .application_repo
            .add_application(make_pending_application("FRN-TEST-0001"));
        let sut = build_rejection_service(&mocks);

        let mut input = make_rejection_input("FRN-TEST-0001");
        input.send_email_to_owner = true;

        // Act
        let result = sut.reject_furnish(input).await;

        // Assert
        let RejectionResult::Success {
            email_sent_to_owner,
            application,
            ..
        } = result
        else {
            panic!("Success を期待");
        };
        assert!(!email_sent_to_owner);
        assert_eq!(application.status(), FurnishStatus::Rejected);
    }

    #[tokio::test]
    async fn test_reject_furnish_ポータル失敗は非致命() {
        // Arrange
        let mocks = MockSet::with_failing_portal();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Suspended));
        mocks
            .application_repo
            .add_application(make_pending_application("FRN-TEST-0001"));
        let sut = build_rejection_service(&mocks);

        // Act
        let result = sut.reject_furnish(make_rejection_input("FRN-TEST-0001")).await;

        // Assert
        let RejectionResult::Success {
            notice_resent_to_portal,
            application,
            ..
        } = result
        else {
            panic!("Success を期待");
        };
        assert!(!notice_resent_to_portal);
        assert_eq!(application.status(), FurnishStatus::Rejected);
    }

    #[tokio::test]
    async fn test_reject_furnish_サスペンションは解除されない() {
        // Arrange: 受付時に適用されたサスペンションが残っている状態
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Suspended));
        mocks
            .application_repo
            .add_application(make_pending_application("FRN-TEST-0001"));
        mocks.suspension_repo.add_suspension(
            noticeflow_domain::furnish::NoticeSuspension::new_ts_pdp(notice_no(), fixed_now()),
        );
        let sut = build_rejection_service(&mocks);

        // Act
        let result = sut.reject_furnish(make_rejection_input("FRN-TEST-0001")).await;

        // Assert: 却下後もサスペンションは有効なまま
        assert!(matches!(result, RejectionResult::Success { .. }));
        let suspension = mocks
            .suspension_repo
            .find_active(&notice_no(), SuspensionType::TsPdp)
            .await
            .unwrap();
        assert!(suspension.is_some());
    }

    #[test]
    fn test_備考整形_自由記述あり() {
        let input = make_rejection_input("FRN-TEST-0001");
        let now = fixed_now();

        let remark = format_rejection_remark(&input, now);

        assert!(remark.starts_with("[OFF-042]"));
        assert!(remark.contains("REJECTED INVALID_PARTICULARS:"));
        assert!(remark.ends_with("契約書の記載と申告内容が一致しない"));
    }

    #[test]
    fn test_備考整形_自由記述なし() {
        let mut input = make_rejection_input("FRN-TEST-0001");
        input.remarks = None;
        let now = fixed_now();

        let remark = format_rejection_remark(&input, now);

        assert!(remark.ends_with("REJECTED INVALID_PARTICULARS"));
    }
}
