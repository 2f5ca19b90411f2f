//! # FurnishDocumentRepository
//!
//! 申告の添付書類リンクの永続化を担当するリポジトリ。
//! 書類本体は外部のブロブストレージにあり、ここでは参照のみ保持する。

use async_trait::async_trait;
use noticeflow_domain::{furnish::FurnishDocument, value_objects::TxnNo};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{db::TxContext, error::InfraError, retry::with_retry};

/// 添付書類リンクリポジトリトレイト
#[async_trait]
pub trait FurnishDocumentRepository: Send + Sync {
    /// 添付書類リンクを一括作成する
    async fn insert_all(
        &self,
        documents: &[FurnishDocument],
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;

    /// トランザクション番号に紐づく添付書類リンク一覧を取得する
    async fn find_by_txn_no(&self, txn_no: &TxnNo) -> Result<Vec<FurnishDocument>, InfraError>;
}

/// PostgreSQL 実装の FurnishDocumentRepository
#[derive(Debug, Clone)]
pub struct PostgresFurnishDocumentRepository {
    pool: PgPool,
}

impl PostgresFurnishDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_document(row: &PgRow) -> Result<FurnishDocument, InfraError> {
    let txn_no: String = row.try_get("txn_no")?;
    Ok(FurnishDocument {
        txn_no:      TxnNo::new(txn_no).map_err(|e| InfraError::unexpected(e.to_string()))?,
        reference:   row.try_get("reference")?,
        file_name:   row.try_get("file_name")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}

#[async_trait]
impl FurnishDocumentRepository for PostgresFurnishDocumentRepository {
    async fn insert_all(
        &self,
        documents: &[FurnishDocument],
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        for document in documents {
            sqlx::query(
                r#"
                INSERT INTO furnish_application_documents (
                    txn_no, reference, file_name, uploaded_at
                )
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(document.txn_no.as_str())
            .bind(&document.reference)
            .bind(&document.file_name)
            .bind(document.uploaded_at)
            .execute(tx.conn())
            .await?;
        }

        Ok(())
    }

    async fn find_by_txn_no(&self, txn_no: &TxnNo) -> Result<Vec<FurnishDocument>, InfraError> {
        let rows = with_retry("furnish_document.find_by_txn_no", || async {
            sqlx::query(
                r#"
                SELECT txn_no, reference, file_name, uploaded_at
                FROM furnish_application_documents
                WHERE txn_no = $1
                ORDER BY uploaded_at
                "#,
            )
            .bind(txn_no.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(InfraError::from)
        })
        .await?;

        rows.iter().map(row_to_document).collect()
    }
}
