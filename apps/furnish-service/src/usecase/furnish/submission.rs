//! # FurnishSubmissionService（申告受付パイプライン）
//!
//! eService からの申告受付を 9 ステップのパイプラインとして実行する。
//!
//! ## 処理フロー
//!
//! 1. 受付監査イベント
//! 2. コンテキスト構築（通知書・既存申請・名宛人・除外リストのスナップショット読み取り）
//! 3. 基本ビジネスルール検証（失敗時は永続化なしで ValidationError を即返却）
//! 4. 再申告判定（情報提供のみ）
//! 5. 自動承認チェック 5 件（短絡なし・全件評価）
//! 6. 申請行の作成（チェック結果に関わらず必ず実行）
//! 7. 添付書類リンクの作成（添付がある場合のみ）
//! 8. 分岐: 自動承認なら名宛人作成 + サスペンション適用 → Success、
//!    不合格ならサスペンション適用のみ → BusinessError（手動審査行き）
//! 9. 予期しない例外はトップレベルで一度だけ TechnicalError に変換
//!
//! ステップ 6〜8 の書き込みは単一トランザクションでコミットされる。

use std::{collections::BTreeMap, sync::Arc};

use noticeflow_domain::value_objects::NoticeNo;
use noticeflow_infra::{
    db::TransactionManager,
    repository::{
        ExclusionListRepository,
        FurnishApplicationRepository,
        NoticeRepository,
        OwnerDriverRepository,
    },
};

use super::{
    FurnishAuditService,
    FurnishPersistenceService,
    FurnishValidator,
    SubmissionInput,
    SubmissionResult,
    context::FurnishContext,
};
use crate::error::CoreError;

/// 申告受付パイプラインのオーケストレータ
pub struct FurnishSubmissionService {
    notice_repo: Arc<dyn NoticeRepository>,
    application_repo: Arc<dyn FurnishApplicationRepository>,
    owner_driver_repo: Arc<dyn OwnerDriverRepository>,
    exclusion_repo: Arc<dyn ExclusionListRepository>,
    persistence: FurnishPersistenceService,
    tx_manager: Arc<dyn TransactionManager>,
    audit: FurnishAuditService,
}

impl FurnishSubmissionService {
    pub fn new(
        notice_repo: Arc<dyn NoticeRepository>,
        application_repo: Arc<dyn FurnishApplicationRepository>,
        owner_driver_repo: Arc<dyn OwnerDriverRepository>,
        exclusion_repo: Arc<dyn ExclusionListRepository>,
        persistence: FurnishPersistenceService,
        tx_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            notice_repo,
            application_repo,
            owner_driver_repo,
            exclusion_repo,
            persistence,
            tx_manager,
            audit: FurnishAuditService::new(),
        }
    }

    /// 申告を受け付ける
    ///
    /// 期待される失敗（検証エラー・業務エラー）は Result バリアントとして
    /// 返される。予期しない例外はここで一度だけ TechnicalError に変換する。
    /// 内部ステップで Result への二重変換は行わない。
    pub async fn submit_furnish(&self, input: SubmissionInput) -> SubmissionResult {
        // 1. 受付監査イベント
        self.audit.submission_received(input.notice_no.trim());

        let notice_no_for_details = input.notice_no.trim().to_string();
        match self.run_pipeline(input).await {
            Ok(result) => result,
            Err(e) => {
                self.audit.technical_error("submit_furnish", &e.to_string());
                let mut details = BTreeMap::new();
                details.insert("notice_no".to_string(), notice_no_for_details);
                SubmissionResult::TechnicalError {
                    operation: "submit_furnish".to_string(),
                    message:   e.to_string(),
                    cause:     e.cause_name().to_string(),
                    details,
                }
            }
        }
    }

    async fn run_pipeline(&self, input: SubmissionInput) -> Result<SubmissionResult, CoreError> {
        // 2. コンテキスト構築
        let mut ctx = self.build_context(input).await?;

        // 3. 基本ビジネスルール検証（失敗時は永続化なしで即返却）
        match FurnishValidator::validate_basic_business_rules(&ctx) {
            Ok(parsed) => ctx.parsed = Some(parsed),
            Err(violation) => {
                self.audit.validation_failed(
                    ctx.request.notice_no.trim(),
                    violation.field,
                    &violation.message,
                );
                return Ok(SubmissionResult::ValidationError {
                    field:      Some(violation.field.to_string()),
                    message:    violation.message,
                    violations: Vec::new(),
                });
            }
        }

        let notice_no = match &ctx.parsed {
            Some(parsed) => parsed.notice_no.clone(),
            None => return Err(CoreError::Internal("構造検証結果が失われました".to_string())),
        };

        // 4. 再申告判定（情報提供のみ。再申告は拒否しない）
        ctx.is_resubmission = self.persistence.is_resubmission(&notice_no).await?;

        // 5. 自動承認チェック（短絡なし・5 件すべて評価）
        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        // 6〜8 の書き込みは単一トランザクション
        let mut tx = self.tx_manager.begin().await?;

        // 6. 申請行の作成（チェック結果に関わらず必ず実行。申告試行の耐久記録）
        self.persistence
            .create_furnish_application(&mut ctx, &mut tx)
            .await?;
        let application = ctx
            .application
            .clone()
            .ok_or_else(|| CoreError::Internal("申請の作成結果が失われました".to_string()))?;
        self.audit.application_created(
            application.txn_no().as_str(),
            notice_no.as_str(),
            application.status().as_code(),
        );

        // 7. 添付書類リンク（添付がある場合のみ）
        if !ctx.request.document_refs.is_empty() {
            let count = self
                .persistence
                .create_furnish_application_documents(&ctx, &mut tx)
                .await?;
            self.audit
                .documents_attached(application.txn_no().as_str(), count);
        }

        // 8. 自動承認可否で分岐
        if ctx.auto_approval_passed {
            self.persistence
                .create_hirer_driver_record(&mut ctx, &mut tx)
                .await?;
            self.audit.hirer_driver_created(
                notice_no.as_str(),
                application.owner_driver_indicator().as_code(),
            );

            self.persistence
                .apply_ts_pdp_suspension(&notice_no, &mut tx)
                .await?;
            ctx.suspension_applied = true;
            self.audit.suspension_applied(notice_no.as_str());

            tx.commit().await?;

            self.audit.auto_approved(application.txn_no().as_str());
            Ok(SubmissionResult::Success {
                application,
                auto_approved: true,
                hirer_driver_record_created: ctx.owner_driver_record_created,
                suspension_applied: ctx.suspension_applied,
                message: "申告は自動承認されました".to_string(),
            })
        } else {
            // 審査待ちでも処理時計は必ず止める（承認分岐と同じ扱い）
            self.persistence
                .apply_ts_pdp_suspension(&notice_no, &mut tx)
                .await?;
            ctx.suspension_applied = true;
            self.audit.suspension_applied(notice_no.as_str());

            tx.commit().await?;

            let reasons = ctx.failure_reasons_joined();
            self.audit
                .manual_review_required(application.txn_no().as_str(), &reasons);
            Ok(SubmissionResult::BusinessError {
                check_type: "AUTO_APPROVAL_FAILED".to_string(),
                message: reasons,
                requires_manual_review: true,
                application: Some(application),
            })
        }
    }

    /// コンテキストを構築し、パイプラインが参照するスナップショットを読み込む
    async fn build_context(&self, input: SubmissionInput) -> Result<FurnishContext, CoreError> {
        let mut ctx = FurnishContext::new(input);

        // 通知書番号が値オブジェクトとして妥当な場合のみスナップショットを読む。
        // 不正な番号は基本検証が「通知書が見つかりません」として扱う。
        if let Ok(notice_no) = NoticeNo::new(ctx.request.notice_no.clone()) {
            ctx.notice = self.notice_repo.find_by_no(&notice_no).await?;
            ctx.existing_applications =
                self.application_repo.find_by_notice_no(&notice_no).await?;
            ctx.existing_owner_drivers =
                self.owner_driver_repo.find_by_notice_no(&notice_no).await?;
        }

        let id_no = ctx.request.furnish_id_no.trim();
        if !id_no.is_empty() {
            ctx.furnished_id_excluded = self.exclusion_repo.contains(id_no).await?;
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use noticeflow_domain::furnish::{
        AddressType,
        FurnishStatus,
        OwnerDriverIndicator,
        SuspensionType,
    };
    use noticeflow_domain::notice::NoticeProcessingStage;
    use noticeflow_infra::repository::SuspensionRepository;
    use pretty_assertions::assert_eq;

    use super::super::test_helpers::{
        MockSet,
        build_submission_service,
        make_notice,
        make_submission_input,
        notice_no,
    };
    use super::*;
    use crate::usecase::furnish::DocumentRefInput;

    #[tokio::test]
    async fn test_submit_furnish_自動承認の正常系() {
        // Arrange
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Issued));
        let sut = build_submission_service(&mocks);

        // Act: 運転者申告・有効な ID・競合なし
        let result = sut.submit_furnish(make_submission_input()).await;

        // Assert
        let SubmissionResult::Success {
            application,
            auto_approved,
            hirer_driver_record_created,
            suspension_applied,
            ..
        } = result
        else {
            panic!("Success を期待");
        };
        assert!(auto_approved);
        assert!(hirer_driver_record_created);
        assert!(suspension_applied);
        assert_eq!(application.status(), FurnishStatus::Approved);

        // 申請行はちょうど 1 件、status = A
        let stored = mocks.application_repo.applications();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status(), FurnishStatus::Approved);

        // 名宛人が offender として upsert されている
        let owner_drivers = mocks.owner_driver_repo.owner_drivers();
        assert_eq!(owner_drivers.len(), 1);
        assert!(owner_drivers[0].offender_indicator());
        assert_eq!(
            owner_drivers[0].indicator(),
            OwnerDriverIndicator::Driver
        );

        // furnished_mail 住所が書き込まれている
        let address = mocks
            .owner_driver_repo
            .find_address(
                &notice_no(),
                OwnerDriverIndicator::Driver,
                AddressType::FurnishedMail,
            )
            .await
            .unwrap();
        assert!(address.is_some());

        // TS-PDP サスペンションが存在する
        let suspension = mocks
            .suspension_repo
            .find_active(&notice_no(), SuspensionType::TsPdp)
            .await
            .unwrap();
        assert!(suspension.is_some());
    }

    #[tokio::test]
    async fn test_submit_furnish_チェック不合格は手動審査行き() {
        // Arrange: ID 形式不正 + レンタル期間なし（賃借人）で 2 件不合格
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Issued));
        let sut = build_submission_service(&mocks);

        let mut input = make_submission_input();
        input.owner_driver_indicator = "H".to_string();
        input.furnish_id_no = "X9999999".to_string();

        // Act
        let result = sut.submit_furnish(input).await;

        // Assert
        let SubmissionResult::BusinessError {
            check_type,
            message,
            requires_manual_review,
            application,
        } = result
        else {
            panic!("BusinessError を期待");
        };
        assert_eq!(check_type, "AUTO_APPROVAL_FAILED");
        assert!(requires_manual_review);
        // 不合格 2 件がどちらも理由に含まれる
        assert!(message.contains("IDENTITY_FORMAT"));
        assert!(message.contains("RENTAL_PERIOD_CONSISTENCY"));

        // 申請行は作成済み・status = P、txn_no を参照できる
        let application = application.expect("作成済み申請が添付されること");
        assert_eq!(application.status(), FurnishStatus::Pending);
        let stored = mocks.application_repo.applications();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status(), FurnishStatus::Pending);

        // 名宛人は作成されない
        assert!(mocks.owner_driver_repo.owner_drivers().is_empty());

        // 審査待ちでもサスペンションは適用される
        let suspension = mocks
            .suspension_repo
            .find_active(&notice_no(), SuspensionType::TsPdp)
            .await
            .unwrap();
        assert!(suspension.is_some());
    }

    #[tokio::test]
    async fn test_submit_furnish_基本検証失敗は永続化なし() {
        // Arrange: 通知書が存在しない
        let mocks = MockSet::new();
        let sut = build_submission_service(&mocks);

        // Act
        let result = sut.submit_furnish(make_submission_input()).await;

        // Assert
        let SubmissionResult::ValidationError { field, .. } = result else {
            panic!("ValidationError を期待");
        };
        assert_eq!(field.as_deref(), Some("notice_no"));

        // 永続化は一切行われない
        assert!(mocks.application_repo.applications().is_empty());
        assert!(mocks.owner_driver_repo.owner_drivers().is_empty());
        assert!(mocks.suspension_repo.suspensions().is_empty());
    }

    #[tokio::test]
    async fn test_submit_furnish_添付書類が永続化される() {
        // Arrange
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Issued));
        let sut = build_submission_service(&mocks);

        let mut input = make_submission_input();
        input.document_refs = vec![
            DocumentRefInput {
                reference: "doc-001".to_string(),
                file_name: "rental_agreement.pdf".to_string(),
            },
            DocumentRefInput {
                reference: "doc-002".to_string(),
                file_name: "id_copy.pdf".to_string(),
            },
        ];

        // Act
        let result = sut.submit_furnish(input).await;

        // Assert
        assert!(matches!(result, SubmissionResult::Success { .. }));
        let documents = mocks.document_repo.documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].reference, "doc-001");
    }

    #[tokio::test]
    async fn test_submit_furnish_添付なしなら書類登録は行われない() {
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Issued));
        let sut = build_submission_service(&mocks);

        let result = sut.submit_furnish(make_submission_input()).await;

        assert!(matches!(result, SubmissionResult::Success { .. }));
        assert!(mocks.document_repo.documents().is_empty());
    }

    #[tokio::test]
    async fn test_submit_furnish_有効なサスペンションがあれば二重適用しない() {
        // Arrange: 1 回目の受付でサスペンションを作成
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Issued));
        let sut = build_submission_service(&mocks);

        let mut first = make_submission_input();
        first.owner_driver_indicator = "H".to_string();
        first.furnish_id_no = "X9999999".to_string();
        let first_result = sut.submit_furnish(first).await;
        assert!(matches!(first_result, SubmissionResult::BusinessError { .. }));

        // Act: 同一通知書への再申告（正当なシナリオ。2 件目の申請行になる）
        let mut second = make_submission_input();
        second.owner_driver_indicator = "H".to_string();
        second.furnish_id_no = "X9999999".to_string();
        let second_result = sut.submit_furnish(second).await;

        // Assert
        assert!(matches!(
            second_result,
            SubmissionResult::BusinessError { .. }
        ));
        assert_eq!(mocks.application_repo.applications().len(), 2);
        // サスペンションは 1 件のまま（冪等）
        assert_eq!(mocks.suspension_repo.suspensions().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_furnish_賃借人申告の自動承認で名宛人がhirerになる() {
        // Arrange
        let mocks = MockSet::new();
        mocks
            .notice_repo
            .add_notice(make_notice(NoticeProcessingStage::Issued));
        let sut = build_submission_service(&mocks);

        let mut input = make_submission_input();
        input.owner_driver_indicator = "H".to_string();
        input.hirer_owner_relationship = Some("レンタカー契約".to_string());
        input.rental_start = Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        input.rental_end = Some(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

        // Act
        let result = sut.submit_furnish(input).await;

        // Assert
        let SubmissionResult::Success { auto_approved, .. } = result else {
            panic!("Success を期待");
        };
        assert!(auto_approved);

        let owner_drivers = mocks.owner_driver_repo.owner_drivers();
        assert_eq!(owner_drivers.len(), 1);
        assert_eq!(owner_drivers[0].indicator(), OwnerDriverIndicator::Hirer);
        assert!(owner_drivers[0].offender_indicator());
    }
}
