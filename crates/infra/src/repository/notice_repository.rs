//! # NoticeRepository
//!
//! 違反通知書の参照を担当するリポジトリ。
//! 通知書の発行・更新は別システムの責務のため、読み取り専用。

use std::str::FromStr;

use async_trait::async_trait;
use noticeflow_domain::{
    notice::{NewNotice, Notice, NoticeProcessingStage},
    value_objects::{NoticeNo, VehicleNo},
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{error::InfraError, retry::with_retry};

/// 違反通知書リポジトリトレイト
#[async_trait]
pub trait NoticeRepository: Send + Sync {
    /// 通知書番号で通知書を取得する
    async fn find_by_no(&self, notice_no: &NoticeNo) -> Result<Option<Notice>, InfraError>;
}

/// PostgreSQL 実装の NoticeRepository
#[derive(Debug, Clone)]
pub struct PostgresNoticeRepository {
    pool: PgPool,
}

impl PostgresNoticeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_notice(row: &PgRow) -> Result<Notice, InfraError> {
    let notice_no: String = row.try_get("notice_no")?;
    let vehicle_no: String = row.try_get("vehicle_no")?;
    let processing_stage: String = row.try_get("processing_stage")?;

    Ok(Notice::new(NewNotice {
        notice_no: NoticeNo::new(notice_no).map_err(|e| InfraError::unexpected(e.to_string()))?,
        vehicle_no: VehicleNo::new(vehicle_no)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        offence_date: row.try_get("offence_date")?,
        processing_stage: NoticeProcessingStage::from_str(&processing_stage)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        owner_name: row.try_get("owner_name")?,
        owner_email: row.try_get("owner_email")?,
        issued_at: row.try_get("issued_at")?,
    }))
}

#[async_trait]
impl NoticeRepository for PostgresNoticeRepository {
    async fn find_by_no(&self, notice_no: &NoticeNo) -> Result<Option<Notice>, InfraError> {
        let row = with_retry("notice.find_by_no", || async {
            sqlx::query(
                r#"
                SELECT
                    notice_no, vehicle_no, offence_date, processing_stage,
                    owner_name, owner_email, issued_at
                FROM notices
                WHERE notice_no = $1
                "#,
            )
            .bind(notice_no.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(InfraError::from)
        })
        .await?;

        row.as_ref().map(row_to_notice).transpose()
    }
}
