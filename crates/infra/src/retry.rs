//! # 一時的な DB エラーに対する有限リトライ
//!
//! 永続化コラボレータ側のリトライポリシー。固定回数・固定ディレイで、
//! 一時的なエラー（接続断・プールタイムアウト）のみ再試行する。
//! ワークフロー層は自前のリトライを一切持たない。

use std::{future::Future, time::Duration};

use crate::error::{InfraError, InfraErrorKind};

/// 最大試行回数（初回を含む）
const MAX_ATTEMPTS: u32 = 3;

/// 再試行間の固定ディレイ
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// エラーが再試行に値する一時的なものか判定する
///
/// 制約違反や構文エラーは再試行しても結果が変わらないため対象外。
fn is_transient(error: &InfraError) -> bool {
    match error.kind() {
        InfraErrorKind::Database(sqlx::Error::Io(_)) => true,
        InfraErrorKind::Database(sqlx::Error::PoolTimedOut) => true,
        InfraErrorKind::Database(sqlx::Error::PoolClosed) => true,
        _ => false,
    }
}

/// 一時的な DB エラーを固定回数リトライして操作を実行する
///
/// # 引数
///
/// - `op_name`: ログ出力用の操作名
/// - `f`: 実行する非同期操作を生成するクロージャ（試行ごとに呼び出される）
pub async fn with_retry<T, F, Fut>(op_name: &str, f: F) -> Result<T, InfraError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, InfraError>>,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_ATTEMPTS && is_transient(&e) => {
                tracing::warn!(
                    operation = op_name,
                    attempt,
                    error = %e,
                    "一時的な DB エラーのため再試行します"
                );
                tokio::time::sleep(RETRY_DELAY).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
