//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//!
//! ## エラーの種類と用途
//!
//! | エラー種別 | 用途 |
//! |-----------|------|
//! | `Validation` | 入力値の検証失敗、不正な状態遷移 |
//! | `NotFound` | エンティティが存在しない |
//! | `Conflict` | 楽観的ロックの失敗、重複操作 |

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// ユースケース層でこのエラーを受け取り、適切な Result バリアントに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 不正な状態遷移（承認済み申告の再却下など）
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// 指定された識別子のエンティティが存在しない場合に使用する。
    ///
    /// # フィールド
    ///
    /// - `entity_type`: エンティティの種類（コンパイル時に決定される `&'static str`）
    /// - `id`: 検索に使用した識別子
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"FurnishApplication", "Notice" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー（楽観的ロック失敗など）
    ///
    /// 同時更新による競合が発生した場合に使用する。
    /// クライアントは最新データを再取得してから再度更新を試みる必要がある。
    #[error("競合が発生しました: {0}")]
    Conflict(String),
}
