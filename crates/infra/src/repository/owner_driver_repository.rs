//! # OwnerDriverRepository
//!
//! 名宛人（OwnerDriver）とその住所の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **複合キー upsert**: `(notice_no, indicator)` で既存行を上書きする。
//!   再申告の承認で名宛人が差し替わるのは正当な業務シナリオ
//! - **住所は取得元ごとに 1 行**: `(notice_no, indicator, address_type)` で upsert

use std::str::FromStr;

use async_trait::async_trait;
use noticeflow_domain::{
    furnish::{
        AddressType,
        FurnishIdType,
        MailingAddress,
        OwnerDriver,
        OwnerDriverAddr,
        OwnerDriverIndicator,
        OwnerDriverRecord,
    },
    value_objects::{FurnishIdNo, FurnishName, NoticeNo, TxnNo},
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{db::TxContext, error::InfraError, retry::with_retry};

/// 名宛人リポジトリトレイト
#[async_trait]
pub trait OwnerDriverRepository: Send + Sync {
    /// 名宛人を upsert する（複合キー: notice_no + indicator）
    async fn upsert(
        &self,
        owner_driver: &OwnerDriver,
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;

    /// 名宛人住所を upsert する（複合キー: notice_no + indicator + address_type）
    async fn upsert_address(
        &self,
        address: &OwnerDriverAddr,
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;

    /// 通知書番号に紐づく名宛人一覧を取得する
    async fn find_by_notice_no(
        &self,
        notice_no: &NoticeNo,
    ) -> Result<Vec<OwnerDriver>, InfraError>;

    /// 複合キーで名宛人を取得する
    async fn find_by_key(
        &self,
        notice_no: &NoticeNo,
        indicator: OwnerDriverIndicator,
    ) -> Result<Option<OwnerDriver>, InfraError>;

    /// 複合キーで名宛人住所を取得する
    async fn find_address(
        &self,
        notice_no: &NoticeNo,
        indicator: OwnerDriverIndicator,
        address_type: AddressType,
    ) -> Result<Option<OwnerDriverAddr>, InfraError>;
}

/// PostgreSQL 実装の OwnerDriverRepository
#[derive(Debug, Clone)]
pub struct PostgresOwnerDriverRepository {
    pool: PgPool,
}

impl PostgresOwnerDriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_owner_driver(row: &PgRow) -> Result<OwnerDriver, InfraError> {
    let to_unexpected = |e: noticeflow_domain::DomainError| InfraError::unexpected(e.to_string());

    let notice_no: String = row.try_get("notice_no")?;
    let indicator: String = row.try_get("indicator")?;
    let name: String = row.try_get("name")?;
    let id_type: String = row.try_get("id_type")?;
    let id_no: String = row.try_get("id_no")?;
    let source_txn_no: Option<String> = row.try_get("source_txn_no")?;

    Ok(OwnerDriver::from_db(OwnerDriverRecord {
        notice_no: NoticeNo::new(notice_no).map_err(to_unexpected)?,
        indicator: OwnerDriverIndicator::from_str(&indicator).map_err(to_unexpected)?,
        name: FurnishName::new(name).map_err(to_unexpected)?,
        id_type: FurnishIdType::from_str(&id_type).map_err(to_unexpected)?,
        id_no: FurnishIdNo::new(id_no).map_err(to_unexpected)?,
        offender_indicator: row.try_get("offender_indicator")?,
        source_txn_no: source_txn_no
            .map(TxnNo::new)
            .transpose()
            .map_err(to_unexpected)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    }))
}

fn row_to_address(row: &PgRow) -> Result<OwnerDriverAddr, InfraError> {
    let to_unexpected = |e: noticeflow_domain::DomainError| InfraError::unexpected(e.to_string());

    let notice_no: String = row.try_get("notice_no")?;
    let indicator: String = row.try_get("indicator")?;
    let address_type: String = row.try_get("address_type")?;

    Ok(OwnerDriverAddr {
        notice_no:    NoticeNo::new(notice_no).map_err(to_unexpected)?,
        indicator:    OwnerDriverIndicator::from_str(&indicator).map_err(to_unexpected)?,
        address_type: AddressType::from_str(&address_type).map_err(to_unexpected)?,
        address:      MailingAddress {
            block_no:      row.try_get("block_no")?,
            street_name:   row.try_get("street_name")?,
            floor_no:      row.try_get("floor_no")?,
            unit_no:       row.try_get("unit_no")?,
            building_name: row.try_get("building_name")?,
            postal_code:   row.try_get("postal_code")?,
        },
        updated_at:   row.try_get("updated_at")?,
    })
}

#[async_trait]
impl OwnerDriverRepository for PostgresOwnerDriverRepository {
    async fn upsert(
        &self,
        owner_driver: &OwnerDriver,
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let id_type: &str = owner_driver.id_type().into();
        sqlx::query(
            r#"
            INSERT INTO owner_drivers (
                notice_no, indicator, name, id_type, id_no,
                offender_indicator, source_txn_no, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (notice_no, indicator) DO UPDATE SET
                name = EXCLUDED.name,
                id_type = EXCLUDED.id_type,
                id_no = EXCLUDED.id_no,
                offender_indicator = EXCLUDED.offender_indicator,
                source_txn_no = EXCLUDED.source_txn_no,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(owner_driver.notice_no().as_str())
        .bind(owner_driver.indicator().as_code())
        .bind(owner_driver.name().as_str())
        .bind(id_type)
        .bind(owner_driver.id_no().as_str())
        .bind(owner_driver.offender_indicator())
        .bind(owner_driver.source_txn_no().map(|t| t.as_str()))
        .bind(owner_driver.created_at())
        .bind(owner_driver.updated_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn upsert_address(
        &self,
        address: &OwnerDriverAddr,
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let address_type: &str = address.address_type.into();
        sqlx::query(
            r#"
            INSERT INTO owner_driver_addrs (
                notice_no, indicator, address_type,
                block_no, street_name, floor_no, unit_no, building_name, postal_code,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (notice_no, indicator, address_type) DO UPDATE SET
                block_no = EXCLUDED.block_no,
                street_name = EXCLUDED.street_name,
                floor_no = EXCLUDED.floor_no,
                unit_no = EXCLUDED.unit_no,
                building_name = EXCLUDED.building_name,
                postal_code = EXCLUDED.postal_code,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(address.notice_no.as_str())
        .bind(address.indicator.as_code())
        .bind(address_type)
        .bind(&address.address.block_no)
        .bind(&address.address.street_name)
        .bind(&address.address.floor_no)
        .bind(&address.address.unit_no)
        .bind(&address.address.building_name)
        .bind(&address.address.postal_code)
        .bind(address.updated_at)
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn find_by_notice_no(
        &self,
        notice_no: &NoticeNo,
    ) -> Result<Vec<OwnerDriver>, InfraError> {
        let rows = with_retry("owner_driver.find_by_notice_no", || async {
            sqlx::query(
                r#"
                SELECT notice_no, indicator, name, id_type, id_no,
                       offender_indicator, source_txn_no, created_at, updated_at
                FROM owner_drivers
                WHERE notice_no = $1
                "#,
            )
            .bind(notice_no.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(InfraError::from)
        })
        .await?;

        rows.iter().map(row_to_owner_driver).collect()
    }

    async fn find_by_key(
        &self,
        notice_no: &NoticeNo,
        indicator: OwnerDriverIndicator,
    ) -> Result<Option<OwnerDriver>, InfraError> {
        let row = with_retry("owner_driver.find_by_key", || async {
            sqlx::query(
                r#"
                SELECT notice_no, indicator, name, id_type, id_no,
                       offender_indicator, source_txn_no, created_at, updated_at
                FROM owner_drivers
                WHERE notice_no = $1 AND indicator = $2
                "#,
            )
            .bind(notice_no.as_str())
            .bind(indicator.as_code())
            .fetch_optional(&self.pool)
            .await
            .map_err(InfraError::from)
        })
        .await?;

        row.as_ref().map(row_to_owner_driver).transpose()
    }

    async fn find_address(
        &self,
        notice_no: &NoticeNo,
        indicator: OwnerDriverIndicator,
        address_type: AddressType,
    ) -> Result<Option<OwnerDriverAddr>, InfraError> {
        let address_type_str: &str = address_type.into();
        let row = with_retry("owner_driver.find_address", || async {
            sqlx::query(
                r#"
                SELECT notice_no, indicator, address_type,
                       block_no, street_name, floor_no, unit_no, building_name, postal_code,
                       updated_at
                FROM owner_driver_addrs
                WHERE notice_no = $1 AND indicator = $2 AND address_type = $3
                "#,
            )
            .bind(notice_no.as_str())
            .bind(indicator.as_code())
            .bind(address_type_str)
            .fetch_optional(&self.pool)
            .await
            .map_err(InfraError::from)
        })
        .await?;

        row.as_ref().map(row_to_address).transpose()
    }
}
