//! # SuspensionRepository
//!
//! 通知書サスペンション（TS-PDP）の永続化を担当するリポジトリ。

use std::str::FromStr;

use async_trait::async_trait;
use noticeflow_domain::{
    furnish::{NoticeSuspension, NoticeSuspensionRecord, SuspensionType},
    value_objects::NoticeNo,
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{db::TxContext, error::InfraError, retry::with_retry};

/// 通知書サスペンションリポジトリトレイト
#[async_trait]
pub trait SuspensionRepository: Send + Sync {
    /// 指定種別の有効な（未解除の）サスペンションを取得する
    async fn find_active(
        &self,
        notice_no: &NoticeNo,
        suspension_type: SuspensionType,
    ) -> Result<Option<NoticeSuspension>, InfraError>;

    /// サスペンションを新規作成する
    async fn insert(
        &self,
        suspension: &NoticeSuspension,
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;

    /// サスペンションを更新する（解除の反映）
    async fn update(
        &self,
        suspension: &NoticeSuspension,
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の SuspensionRepository
#[derive(Debug, Clone)]
pub struct PostgresSuspensionRepository {
    pool: PgPool,
}

impl PostgresSuspensionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_suspension(row: &PgRow) -> Result<NoticeSuspension, InfraError> {
    let to_unexpected = |e: noticeflow_domain::DomainError| InfraError::unexpected(e.to_string());

    let notice_no: String = row.try_get("notice_no")?;
    let suspension_type: String = row.try_get("suspension_type")?;

    Ok(NoticeSuspension::from_db(NoticeSuspensionRecord {
        notice_no: NoticeNo::new(notice_no).map_err(to_unexpected)?,
        suspension_type: SuspensionType::from_str(&suspension_type).map_err(to_unexpected)?,
        start_at: row.try_get("start_at")?,
        end_at: row.try_get("end_at")?,
        revived_at: row.try_get("revived_at")?,
    }))
}

#[async_trait]
impl SuspensionRepository for PostgresSuspensionRepository {
    async fn find_active(
        &self,
        notice_no: &NoticeNo,
        suspension_type: SuspensionType,
    ) -> Result<Option<NoticeSuspension>, InfraError> {
        let row = with_retry("suspension.find_active", || async {
            sqlx::query(
                r#"
                SELECT notice_no, suspension_type, start_at, end_at, revived_at
                FROM notice_suspensions
                WHERE notice_no = $1 AND suspension_type = $2 AND revived_at IS NULL
                ORDER BY start_at DESC
                LIMIT 1
                "#,
            )
            .bind(notice_no.as_str())
            .bind(suspension_type.as_code())
            .fetch_optional(&self.pool)
            .await
            .map_err(InfraError::from)
        })
        .await?;

        row.as_ref().map(row_to_suspension).transpose()
    }

    async fn insert(
        &self,
        suspension: &NoticeSuspension,
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO notice_suspensions (
                notice_no, suspension_type, start_at, end_at, revived_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(suspension.notice_no().as_str())
        .bind(suspension.suspension_type().as_code())
        .bind(suspension.start_at())
        .bind(suspension.end_at())
        .bind(suspension.revived_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        suspension: &NoticeSuspension,
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE notice_suspensions
            SET revived_at = $1
            WHERE notice_no = $2 AND suspension_type = $3 AND start_at = $4
            "#,
        )
        .bind(suspension.revived_at())
        .bind(suspension.notice_no().as_str())
        .bind(suspension.suspension_type().as_code())
        .bind(suspension.start_at())
        .execute(tx.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "NoticeSuspension",
                suspension.notice_no().as_str(),
            ));
        }

        Ok(())
    }
}
