//! # ページネーション付きレスポンス
//!
//! ページ番号ベースのページネーションに対応した API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// `ApiResponse<T>` が単一データ用であるのに対し、
/// `PaginatedResponse<T>` はリスト + 件数情報のページネーション形式。
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "total_records": 42,
///   "page": 1,
///   "total_pages": 3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data:          Vec<T>,
    pub total_records: u64,
    pub page:          u32,
    pub total_pages:   u32,
}

impl<T> PaginatedResponse<T> {
    /// 総件数とページサイズから `total_pages` を計算して作成する
    ///
    /// `page_size` が 0 の場合は `total_pages = 0` とする（ゼロ除算回避）。
    pub fn new(data: Vec<T>, total_records: u64, page: u32, page_size: u32) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_records.div_ceil(u64::from(page_size)) as u32
        };
        Self {
            data,
            total_records,
            page,
            total_pages,
        }
    }
}
