//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換など、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use noticeflow_infra::InfraError;

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// `find_by_*` 等の `Option` を返すリポジトリメソッドの結果を、
/// `CoreError::NotFound` または `CoreError::Internal` に変換する。
///
/// ```ignore
/// // Before
/// let application = self.application_repo.find_by_txn_no(&txn_no).await
///     .map_err(|e| CoreError::Internal(format!("申告申請の取得に失敗: {}", e)))?
///     .ok_or_else(|| CoreError::NotFound("申告申請が見つかりません".to_string()))?;
///
/// // After
/// let application = self.application_repo.find_by_txn_no(&txn_no).await
///     .or_not_found("申告申請")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は `CoreError::Internal` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError> {
        self.map_err(|e| CoreError::Internal(format!("{}の取得に失敗: {}", entity_name, e)))?
            .ok_or_else(|| CoreError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}
