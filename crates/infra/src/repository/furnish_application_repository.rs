//! # FurnishApplicationRepository
//!
//! 申告申請の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **追記専用**: 申請行は作成後、審査担当官によるステータス遷移と
//!   備考追記以外では更新されない
//! - **楽観的ロック**: 更新は `version` の一致チェック付きで行う
//! - **書き込みの構造的強制**: 書き込みは `&mut TxContext` を要求する

use std::str::FromStr;

use async_trait::async_trait;
use noticeflow_domain::{
    furnish::{
        FurnishApplication,
        FurnishApplicationRecord,
        FurnishIdType,
        FurnishQuestionAnswers,
        FurnishStatus,
        MailingAddress,
        OwnerDriverIndicator,
        RentalPeriod,
    },
    value_objects::{FurnishIdNo, FurnishName, NoticeNo, TxnNo, VehicleNo, Version},
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{db::TxContext, error::InfraError, retry::with_retry};

/// 申告申請リポジトリトレイト
#[async_trait]
pub trait FurnishApplicationRepository: Send + Sync {
    /// 申請を新規作成する
    async fn insert(
        &self,
        application: &FurnishApplication,
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;

    /// バージョン一致チェック付きで申請を更新する
    ///
    /// # エラー
    ///
    /// - `InfraError::Conflict`: DB 上のバージョンが期待値と一致しない場合
    async fn update_with_version_check(
        &self,
        application: &FurnishApplication,
        expected_version: Version,
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;

    /// トランザクション番号で申請を取得する
    async fn find_by_txn_no(
        &self,
        txn_no: &TxnNo,
    ) -> Result<Option<FurnishApplication>, InfraError>;

    /// 通知書番号に紐づく申請一覧を取得する
    async fn find_by_notice_no(
        &self,
        notice_no: &NoticeNo,
    ) -> Result<Vec<FurnishApplication>, InfraError>;

    /// 通知書に対する申請が 1 件以上存在するか（再申告判定）
    async fn exists_for_notice(&self, notice_no: &NoticeNo) -> Result<bool, InfraError>;

    /// 指定ステータスの申請一覧を取得する（ダッシュボード用）
    async fn find_by_statuses(
        &self,
        statuses: &[FurnishStatus],
    ) -> Result<Vec<FurnishApplication>, InfraError>;

    /// 全申請を取得する（ダッシュボード用、ステータス指定なし）
    async fn find_all(&self) -> Result<Vec<FurnishApplication>, InfraError>;
}

/// PostgreSQL 実装の FurnishApplicationRepository
#[derive(Debug, Clone)]
pub struct PostgresFurnishApplicationRepository {
    pool: PgPool,
}

impl PostgresFurnishApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    txn_no, notice_no, vehicle_no, offence_date,
    furnish_name, furnish_id_type, furnish_id_no,
    owner_driver_indicator, hirer_owner_relationship,
    block_no, street_name, floor_no, unit_no, building_name, postal_code,
    email, phone, question_1, question_2, question_3,
    rental_start, rental_end, remarks, status, version,
    decided_at, submitted_at, created_at, updated_at
"#;

fn row_to_application(row: &PgRow) -> Result<FurnishApplication, InfraError> {
    let to_unexpected = |e: noticeflow_domain::DomainError| InfraError::unexpected(e.to_string());

    let txn_no: String = row.try_get("txn_no")?;
    let notice_no: String = row.try_get("notice_no")?;
    let vehicle_no: String = row.try_get("vehicle_no")?;
    let furnish_name: String = row.try_get("furnish_name")?;
    let furnish_id_type: String = row.try_get("furnish_id_type")?;
    let furnish_id_no: String = row.try_get("furnish_id_no")?;
    let indicator: String = row.try_get("owner_driver_indicator")?;
    let status: String = row.try_get("status")?;
    let version: i32 = row.try_get("version")?;

    let rental_start: Option<chrono::NaiveDate> = row.try_get("rental_start")?;
    let rental_end: Option<chrono::NaiveDate> = row.try_get("rental_end")?;
    let rental_period = match (rental_start, rental_end) {
        (Some(start), Some(end)) => Some(RentalPeriod::new(start, end).map_err(to_unexpected)?),
        _ => None,
    };

    FurnishApplication::from_db(FurnishApplicationRecord {
        txn_no: TxnNo::new(txn_no).map_err(to_unexpected)?,
        notice_no: NoticeNo::new(notice_no).map_err(to_unexpected)?,
        vehicle_no: VehicleNo::new(vehicle_no).map_err(to_unexpected)?,
        offence_date: row.try_get("offence_date")?,
        furnish_name: FurnishName::new(furnish_name).map_err(to_unexpected)?,
        furnish_id_type: FurnishIdType::from_str(&furnish_id_type).map_err(to_unexpected)?,
        furnish_id_no: FurnishIdNo::new(furnish_id_no).map_err(to_unexpected)?,
        owner_driver_indicator: OwnerDriverIndicator::from_str(&indicator)
            .map_err(to_unexpected)?,
        hirer_owner_relationship: row.try_get("hirer_owner_relationship")?,
        mailing_address: MailingAddress {
            block_no:      row.try_get("block_no")?,
            street_name:   row.try_get("street_name")?,
            floor_no:      row.try_get("floor_no")?,
            unit_no:       row.try_get("unit_no")?,
            building_name: row.try_get("building_name")?,
            postal_code:   row.try_get("postal_code")?,
        },
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        question_answers: FurnishQuestionAnswers {
            question_1: row.try_get("question_1")?,
            question_2: row.try_get("question_2")?,
            question_3: row.try_get("question_3")?,
        },
        rental_period,
        remarks: row.try_get("remarks")?,
        status: FurnishStatus::from_str(&status).map_err(to_unexpected)?,
        version: Version::try_from(version).map_err(to_unexpected)?,
        decided_at: row.try_get("decided_at")?,
        submitted_at: row.try_get("submitted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
    .map_err(to_unexpected)
}

#[async_trait]
impl FurnishApplicationRepository for PostgresFurnishApplicationRepository {
    async fn insert(
        &self,
        application: &FurnishApplication,
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO furnish_applications (
                txn_no, notice_no, vehicle_no, offence_date,
                furnish_name, furnish_id_type, furnish_id_no,
                owner_driver_indicator, hirer_owner_relationship,
                block_no, street_name, floor_no, unit_no, building_name, postal_code,
                email, phone, question_1, question_2, question_3,
                rental_start, rental_end, remarks, status, version,
                decided_at, submitted_at, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29
            )
            "#,
        )
        .bind(application.txn_no().as_str())
        .bind(application.notice_no().as_str())
        .bind(application.vehicle_no().as_str())
        .bind(application.offence_date())
        .bind(application.furnish_name().as_str())
        .bind::<&str>(application.furnish_id_type().into())
        .bind(application.furnish_id_no().as_str())
        .bind(application.owner_driver_indicator().as_code())
        .bind(application.hirer_owner_relationship())
        .bind(&application.mailing_address().block_no)
        .bind(&application.mailing_address().street_name)
        .bind(&application.mailing_address().floor_no)
        .bind(&application.mailing_address().unit_no)
        .bind(&application.mailing_address().building_name)
        .bind(&application.mailing_address().postal_code)
        .bind(application.email())
        .bind(application.phone())
        .bind(&application.question_answers().question_1)
        .bind(&application.question_answers().question_2)
        .bind(&application.question_answers().question_3)
        .bind(application.rental_period().map(|p| p.start()))
        .bind(application.rental_period().map(|p| p.end()))
        .bind(application.remarks())
        .bind(application.status().as_code())
        .bind(application.version().as_i32())
        .bind(application.decided_at())
        .bind(application.submitted_at())
        .bind(application.created_at())
        .bind(application.updated_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn update_with_version_check(
        &self,
        application: &FurnishApplication,
        expected_version: Version,
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE furnish_applications
            SET status = $1, remarks = $2, version = $3,
                decided_at = $4, updated_at = $5
            WHERE txn_no = $6 AND version = $7
            "#,
        )
        .bind(application.status().as_code())
        .bind(application.remarks())
        .bind(application.version().as_i32())
        .bind(application.decided_at())
        .bind(application.updated_at())
        .bind(application.txn_no().as_str())
        .bind(expected_version.as_i32())
        .execute(tx.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "FurnishApplication",
                application.txn_no().as_str(),
            ));
        }

        Ok(())
    }

    async fn find_by_txn_no(
        &self,
        txn_no: &TxnNo,
    ) -> Result<Option<FurnishApplication>, InfraError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM furnish_applications WHERE txn_no = $1"
        );
        let row = with_retry("furnish_application.find_by_txn_no", || async {
            sqlx::query(&query)
                .bind(txn_no.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(InfraError::from)
        })
        .await?;

        row.as_ref().map(row_to_application).transpose()
    }

    async fn find_by_notice_no(
        &self,
        notice_no: &NoticeNo,
    ) -> Result<Vec<FurnishApplication>, InfraError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM furnish_applications \
             WHERE notice_no = $1 ORDER BY submitted_at"
        );
        let rows = with_retry("furnish_application.find_by_notice_no", || async {
            sqlx::query(&query)
                .bind(notice_no.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(InfraError::from)
        })
        .await?;

        rows.iter().map(row_to_application).collect()
    }

    async fn exists_for_notice(&self, notice_no: &NoticeNo) -> Result<bool, InfraError> {
        let row = with_retry("furnish_application.exists_for_notice", || async {
            sqlx::query(
                "SELECT EXISTS(SELECT 1 FROM furnish_applications WHERE notice_no = $1) AS found",
            )
            .bind(notice_no.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(InfraError::from)
        })
        .await?;

        Ok(row.try_get("found")?)
    }

    async fn find_by_statuses(
        &self,
        statuses: &[FurnishStatus],
    ) -> Result<Vec<FurnishApplication>, InfraError> {
        let codes: Vec<String> = statuses.iter().map(|s| s.as_code().to_string()).collect();
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM furnish_applications \
             WHERE status = ANY($1) ORDER BY submitted_at DESC"
        );
        let rows = with_retry("furnish_application.find_by_statuses", || async {
            sqlx::query(&query)
                .bind(&codes)
                .fetch_all(&self.pool)
                .await
                .map_err(InfraError::from)
        })
        .await?;

        rows.iter().map(row_to_application).collect()
    }

    async fn find_all(&self) -> Result<Vec<FurnishApplication>, InfraError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM furnish_applications ORDER BY submitted_at DESC"
        );
        let rows = with_retry("furnish_application.find_all", || async {
            sqlx::query(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(InfraError::from)
        })
        .await?;

        rows.iter().map(row_to_application).collect()
    }
}
