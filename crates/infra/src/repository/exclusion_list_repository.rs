//! # ExclusionListRepository
//!
//! 申告対象者 ID の除外リスト（ブラックリスト）の参照を担当するリポジトリ。
//! リストの管理は別システムの責務のため、読み取り専用。

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::{error::InfraError, retry::with_retry};

/// 除外リストリポジトリトレイト
#[async_trait]
pub trait ExclusionListRepository: Send + Sync {
    /// 指定した ID 番号が除外リストに載っているか
    async fn contains(&self, id_no: &str) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の ExclusionListRepository
#[derive(Debug, Clone)]
pub struct PostgresExclusionListRepository {
    pool: PgPool,
}

impl PostgresExclusionListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExclusionListRepository for PostgresExclusionListRepository {
    async fn contains(&self, id_no: &str) -> Result<bool, InfraError> {
        let row = with_retry("exclusion_list.contains", || async {
            sqlx::query("SELECT EXISTS(SELECT 1 FROM id_exclusion_list WHERE id_no = $1) AS found")
                .bind(id_no)
                .fetch_one(&self.pool)
                .await
                .map_err(InfraError::from)
        })
        .await?;

        Ok(row.try_get("found")?)
    }
}
