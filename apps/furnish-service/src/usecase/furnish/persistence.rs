//! # FurnishPersistenceService（永続化オーケストレーション）
//!
//! 申告ワークフローで耐久状態を変更してよい唯一のコンポーネント。
//! 申告 1 件分の書き込みは呼び出し側が開始した同一の `TxContext` を共有し、
//! 単一トランザクションとしてコミットされる。
//!
//! 永続化層の例外はそのまま `CoreError` として送出され、この層では
//! リトライしない（一時的エラーのリトライは永続化コラボレータ側の責務）。

use std::sync::Arc;

use noticeflow_domain::{
    clock::Clock,
    furnish::{
        AddressType,
        FurnishApplication,
        FurnishDocument,
        FurnishQuestionAnswers,
        MailingAddress,
        NewFurnishApplication,
        NewOwnerDriver,
        NoticeSuspension,
        OwnerDriver,
        OwnerDriverAddr,
        SuspensionType,
    },
    value_objects::{NoticeNo, TxnNo, Version},
};
use noticeflow_infra::{
    db::TxContext,
    repository::{
        FurnishApplicationRepository,
        FurnishDocumentRepository,
        OwnerDriverRepository,
        SuspensionRepository,
    },
};

use super::context::FurnishContext;
use crate::error::CoreError;

/// 申告ワークフローの永続化サービス
pub struct FurnishPersistenceService {
    application_repo: Arc<dyn FurnishApplicationRepository>,
    document_repo: Arc<dyn FurnishDocumentRepository>,
    owner_driver_repo: Arc<dyn OwnerDriverRepository>,
    suspension_repo: Arc<dyn SuspensionRepository>,
    clock: Arc<dyn Clock>,
}

impl FurnishPersistenceService {
    pub fn new(
        application_repo: Arc<dyn FurnishApplicationRepository>,
        document_repo: Arc<dyn FurnishDocumentRepository>,
        owner_driver_repo: Arc<dyn OwnerDriverRepository>,
        suspension_repo: Arc<dyn SuspensionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            application_repo,
            document_repo,
            owner_driver_repo,
            suspension_repo,
            clock,
        }
    }

    /// 同一通知書への申請が既に存在するか（再申告判定）
    ///
    /// 情報提供のみに使用する。再申告は正当な業務シナリオであり拒否しない。
    pub async fn is_resubmission(&self, notice_no: &NoticeNo) -> Result<bool, CoreError> {
        Ok(self.application_repo.exists_for_notice(notice_no).await?)
    }

    /// 申告申請行を作成する
    ///
    /// 自動承認チェックの結果に関わらず必ず呼び出される（申告試行の耐久記録）。
    /// `auto_approval_passed` の場合は同一トランザクション内で
    /// P → A の即時遷移を適用して status = A で永続化する。
    pub async fn create_furnish_application(
        &self,
        ctx: &mut FurnishContext,
        tx: &mut TxContext,
    ) -> Result<(), CoreError> {
        let parsed = ctx
            .parsed
            .clone()
            .ok_or_else(|| CoreError::Internal("構造検証前に申請を作成できません".to_string()))?;
        let notice = ctx
            .notice
            .clone()
            .ok_or_else(|| CoreError::Internal("通知書未解決のまま申請を作成できません".to_string()))?;

        let now = self.clock.now();
        let request = &ctx.request;

        let mut application = FurnishApplication::new(NewFurnishApplication {
            txn_no: TxnNo::generate(),
            notice_no: parsed.notice_no,
            vehicle_no: parsed.vehicle_no,
            offence_date: notice.offence_date(),
            furnish_name: parsed.furnish_name,
            furnish_id_type: parsed.furnish_id_type,
            furnish_id_no: parsed.furnish_id_no,
            owner_driver_indicator: parsed.owner_driver_indicator,
            hirer_owner_relationship: request.hirer_owner_relationship.clone(),
            mailing_address: MailingAddress {
                block_no:      request.mailing_address.block_no.clone(),
                street_name:   request.mailing_address.street_name.clone(),
                floor_no:      request.mailing_address.floor_no.clone(),
                unit_no:       request.mailing_address.unit_no.clone(),
                building_name: request.mailing_address.building_name.clone(),
                postal_code:   request.mailing_address.postal_code.clone(),
            },
            email: request.email.clone(),
            phone: request.phone.clone(),
            question_answers: FurnishQuestionAnswers {
                question_1: request.question_1.clone(),
                question_2: request.question_2.clone(),
                question_3: request.question_3.clone(),
            },
            rental_period: parsed.rental_period,
            now,
        });

        if ctx.auto_approval_passed {
            application = application
                .approved(now)
                .map_err(|e| CoreError::Internal(format!("自動承認の適用に失敗: {}", e)))?;
        }

        self.application_repo.insert(&application, tx).await?;
        ctx.application = Some(application);
        Ok(())
    }

    /// 添付書類リンクを作成する
    ///
    /// リクエストに添付がない場合、このメソッド自体が呼ばれない。
    pub async fn create_furnish_application_documents(
        &self,
        ctx: &FurnishContext,
        tx: &mut TxContext,
    ) -> Result<usize, CoreError> {
        let application = ctx
            .application
            .as_ref()
            .ok_or_else(|| CoreError::Internal("申請未作成のまま書類を登録できません".to_string()))?;

        let now = self.clock.now();
        let documents: Vec<FurnishDocument> = ctx
            .request
            .document_refs
            .iter()
            .map(|d| {
                FurnishDocument::new(
                    application.txn_no().clone(),
                    &d.reference,
                    &d.file_name,
                    now,
                )
            })
            .collect();

        self.document_repo.insert_all(&documents, tx).await?;
        Ok(documents.len())
    }

    /// 名宛人レコードを作成・更新する（自動承認成立時のみ呼ばれる）
    ///
    /// `(notice_no, indicator)` の名宛人を upsert して現在の名宛対象
    /// （offender_indicator = true）とし、申告された郵送先住所を
    /// `furnished_mail` 種別の住所行として書き込む。
    pub async fn create_hirer_driver_record(
        &self,
        ctx: &mut FurnishContext,
        tx: &mut TxContext,
    ) -> Result<(), CoreError> {
        let application = ctx
            .application
            .clone()
            .ok_or_else(|| CoreError::Internal("申請未作成のまま名宛人を作成できません".to_string()))?;

        let owner_driver = self.upsert_hirer_driver(&application, tx).await?;

        ctx.owner_driver = Some(owner_driver);
        ctx.owner_driver_record_created = true;
        Ok(())
    }

    /// 申請内容から名宛人と `furnished_mail` 住所を upsert する
    ///
    /// 受付パイプライン（自動承認）と承認パイプライン（手動承認）で共用。
    pub async fn upsert_hirer_driver(
        &self,
        application: &FurnishApplication,
        tx: &mut TxContext,
    ) -> Result<OwnerDriver, CoreError> {
        let now = self.clock.now();

        let owner_driver = OwnerDriver::new(NewOwnerDriver {
            notice_no: application.notice_no().clone(),
            indicator: application.owner_driver_indicator(),
            name: application.furnish_name().clone(),
            id_type: application.furnish_id_type(),
            id_no: application.furnish_id_no().clone(),
            offender_indicator: true,
            source_txn_no: Some(application.txn_no().clone()),
            now,
        });
        self.owner_driver_repo.upsert(&owner_driver, tx).await?;

        let address = OwnerDriverAddr {
            notice_no:    application.notice_no().clone(),
            indicator:    application.owner_driver_indicator(),
            address_type: AddressType::FurnishedMail,
            address:      application.mailing_address().clone(),
            updated_at:   now,
        };
        self.owner_driver_repo.upsert_address(&address, tx).await?;

        Ok(owner_driver)
    }

    /// TS-PDP サスペンションを冪等に適用する
    ///
    /// 自動承認・審査待ちのどちらでも受付時に必ず呼ばれる（処理時計は常に止める）。
    /// 有効な TS-PDP が既にあれば何もしない。
    /// 戻り値は新規作成したかどうか（既存利用時は false）。
    pub async fn apply_ts_pdp_suspension(
        &self,
        notice_no: &NoticeNo,
        tx: &mut TxContext,
    ) -> Result<bool, CoreError> {
        let existing = self
            .suspension_repo
            .find_active(notice_no, SuspensionType::TsPdp)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let suspension = NoticeSuspension::new_ts_pdp(notice_no.clone(), self.clock.now());
        self.suspension_repo.insert(&suspension, tx).await?;
        Ok(true)
    }

    /// TS-PDP サスペンションを解除する（承認の処分時のみ）
    ///
    /// 有効なサスペンションがなければ何もしない。戻り値は解除したかどうか。
    pub async fn revive_ts_pdp_suspension(
        &self,
        notice_no: &NoticeNo,
        tx: &mut TxContext,
    ) -> Result<bool, CoreError> {
        let Some(active) = self
            .suspension_repo
            .find_active(notice_no, SuspensionType::TsPdp)
            .await?
        else {
            return Ok(false);
        };

        let revived = active
            .revived(self.clock.now())
            .map_err(|e| CoreError::Conflict(e.to_string()))?;
        self.suspension_repo.update(&revived, tx).await?;
        Ok(true)
    }

    /// バージョン一致チェック付きで申請を更新する（処分の反映）
    pub async fn update_application(
        &self,
        application: &FurnishApplication,
        expected_version: Version,
        tx: &mut TxContext,
    ) -> Result<(), CoreError> {
        self.application_repo
            .update_with_version_check(application, expected_version, tx)
            .await
            .map_err(|e| {
                if e.as_conflict().is_some() {
                    CoreError::Conflict(
                        "申請は既に更新されています。最新の情報を取得してください。".to_string(),
                    )
                } else {
                    CoreError::Database(e)
                }
            })
    }
}
