//! # FurnishApprovalService（審査担当官による承認）
//!
//! 手動審査に回った申告を審査担当官が承認するパイプライン。
//! 却下と同じ状態機械ガードを持ち、承認の処分でのみ
//! TS-PDP サスペンションが解除される。
//!
//! ## 処理フロー
//!
//! 1. txn_no で申請を取得（不在なら ValidationError）
//! 2. 状態機械ガード（ALREADY_APPROVED / ALREADY_REJECTED は BusinessError）
//! 3. status = A へ遷移し、備考を追記
//! 4. 単一トランザクションで申請更新 + 名宛人 upsert + サスペンション解除
//! 5. 副作用フラグ付きで Success を返す

use std::{collections::BTreeMap, sync::Arc};

use noticeflow_domain::{clock::Clock, furnish::FurnishStatus, value_objects::TxnNo};
use noticeflow_infra::{db::TransactionManager, repository::FurnishApplicationRepository};

use super::{ApprovalInput, ApprovalResult, FurnishAuditService, FurnishPersistenceService};
use crate::error::CoreError;

/// 承認パイプラインのオーケストレータ
pub struct FurnishApprovalService {
    application_repo: Arc<dyn FurnishApplicationRepository>,
    persistence: FurnishPersistenceService,
    tx_manager: Arc<dyn TransactionManager>,
    clock: Arc<dyn Clock>,
    audit: FurnishAuditService,
}

impl FurnishApprovalService {
    pub fn new(
        application_repo: Arc<dyn FurnishApplicationRepository>,
        persistence: FurnishPersistenceService,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            application_repo,
            persistence,
            tx_manager,
            clock,
            audit: FurnishAuditService::new(),
        }
    }

    /// 申告を承認する
    ///
    /// 予期しない例外はここで一度だけ TechnicalError に変換する。
    pub async fn approve_furnish(&self, input: ApprovalInput) -> ApprovalResult {
        let txn_no_for_details = input.txn_no.trim().to_string();
        match self.run_pipeline(input).await {
            Ok(result) => result,
            Err(e) => {
                self.audit
                    .technical_error("approve_furnish", &e.to_string());
                let mut details = BTreeMap::new();
                details.insert("txn_no".to_string(), txn_no_for_details);
                ApprovalResult::TechnicalError {
                    operation: "approve_furnish".to_string(),
                    message:   e.to_string(),
                    cause:     e.cause_name().to_string(),
                    details,
                }
            }
        }
    }

    async fn run_pipeline(&self, input: ApprovalInput) -> Result<ApprovalResult, CoreError> {
        // 1. txn_no で申請を取得
        let Ok(txn_no) = TxnNo::new(input.txn_no.clone()) else {
            return Ok(ApprovalResult::ValidationError {
                field:   Some("txn_no".to_string()),
                message: "トランザクション番号が不正です".to_string(),
            });
        };
        let Some(application) = self.application_repo.find_by_txn_no(&txn_no).await? else {
            return Ok(ApprovalResult::ValidationError {
                field:   Some("txn_no".to_string()),
                message: format!("申告申請が見つかりません: {}", txn_no),
            });
        };

        // 2. 状態機械ガード
        match application.status() {
            FurnishStatus::Approved => {
                return Ok(ApprovalResult::BusinessError {
                    reason:  "ALREADY_APPROVED".to_string(),
                    message: "既に承認済みの申告です".to_string(),
                });
            }
            FurnishStatus::Rejected => {
                return Ok(ApprovalResult::BusinessError {
                    reason:  "ALREADY_REJECTED".to_string(),
                    message: "却下済みの申告は承認できません".to_string(),
                });
            }
            FurnishStatus::Pending => {}
        }

        let now = self.clock.now();

        // 3. status = A へ遷移し、備考を追記
        let expected_version = application.version();
        let remark = match input.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
            Some(text) => format!(
                "[{}] {} APPROVED: {}",
                input.officer_id,
                now.to_rfc3339(),
                text.trim()
            ),
            None => format!("[{}] {} APPROVED", input.officer_id, now.to_rfc3339()),
        };
        let approved = application
            .approved(now)
            .map_err(|e| CoreError::Internal(format!("承認遷移に失敗: {}", e)))?
            .with_appended_remark(&remark, now);

        // 4. 申請更新・名宛人 upsert・サスペンション解除を単一トランザクションで実行
        let mut tx = self.tx_manager.begin().await?;

        self.persistence
            .update_application(&approved, expected_version, &mut tx)
            .await?;

        self.persistence.upsert_hirer_driver(&approved, &mut tx).await?;
        self.audit.hirer_driver_created(
            approved.notice_no().as_str(),
            approved.owner_driver_indicator().as_code(),
        );

        // 承認の処分でのみ処理時計を再開する
        let suspension_revived = self
            .persistence
            .revive_ts_pdp_suspension(approved.notice_no(), &mut tx)
            .await?;

        tx.commit().await?;

        if suspension_revived {
            self.audit.suspension_revived(approved.notice_no().as_str());
        }
        self.audit
            .application_approved(approved.txn_no().as_str(), &input.officer_id);

        Ok(ApprovalResult::Success {
            application: approved,
            hirer_driver_record_created: true,
            suspension_revived,
            message: "申告を承認しました".to_string(),
        })
    }
}
