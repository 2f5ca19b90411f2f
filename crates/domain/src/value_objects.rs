//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: プリミティブ型をラップし、型安全性を確保
//! - **バリデーション**: 生成時に検証し、不正な値の存在を型レベルで排除
//! - **不変性**: 一度作成したら変更不可
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Version`] | `u32` | エンティティのバージョン番号（楽観的ロック） |
//! | [`TxnNo`] | `String` | 申告トランザクション番号（申告の主キー） |
//! | [`NoticeNo`] | `String` | 違反通知書番号 |
//! | [`VehicleNo`] | `String` | 車両番号 |
//! | [`FurnishName`] | `String` | 申告対象者氏名（PII） |
//! | [`FurnishIdNo`] | `String` | 申告対象者 ID 番号（PII） |

use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// 楽観的ロックによる並行更新検出に使用。
/// 1 から始まり、状態遷移のたびにインクリメントされる。
///
/// # 不変条件
///
/// - バージョン番号は 1 以上
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）を作成する
    pub fn initial() -> Self {
        Self(1)
    }

    /// 指定した値からバージョンを作成する
    ///
    /// # エラー
    ///
    /// 0 は無効（バージョンは 1 以上）。`DomainError::Validation` を返す。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    ///
    /// # パニック
    ///
    /// u32 の最大値を超える場合はパニックする。実運用では到達しない想定。
    pub fn next(&self) -> Self {
        Self(
            self.0
                .checked_add(1)
                .expect("バージョン番号がオーバーフローしました"),
        )
    }

    /// 内部の u32 値を取得する
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    ///
    /// # パニック
    ///
    /// i32 の範囲を超える場合はパニックする。
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).expect("バージョン番号が i32 の範囲を超えています")
    }
}

impl TryFrom<i32> for Version {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value as u32))
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =========================================================================
// TxnNo（申告トランザクション番号）
// =========================================================================

/// 申告トランザクション番号（値オブジェクト）
///
/// 申告 1 件につき 1 つ発番される一意の識別子で、
/// `furnish_applications` テーブルの主キー。
/// 再申告は新しい TxnNo を採番するため、同一通知書に複数の TxnNo が存在しうる。
///
/// # 不変条件
///
/// - 空文字列ではない
/// - 最大 40 文字
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxnNo(String);

impl TxnNo {
    /// 指定した値からトランザクション番号を作成する
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "トランザクション番号は必須です".to_string(),
            ));
        }

        if value.chars().count() > 40 {
            return Err(DomainError::Validation(
                "トランザクション番号は 40 文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 新しいトランザクション番号を発番する
    ///
    /// UUID v7 由来のため呼び出しごとに一意で、時系列順にソート可能。
    pub fn generate() -> Self {
        Self(format!(
            "FRN-{}",
            uuid::Uuid::now_v7().simple().to_string().to_uppercase()
        ))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TxnNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// NoticeNo（違反通知書番号）
// =========================================================================

define_validated_string! {
    /// 違反通知書番号（値オブジェクト）
    ///
    /// 交通違反通知書の識別子。発行システム側で採番され、
    /// 本サービスでは参照のみ行う。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 20 文字
    pub struct NoticeNo {
        label: "通知書番号",
        max_length: 20,
    }
}

// =========================================================================
// VehicleNo（車両番号）
// =========================================================================

define_validated_string! {
    /// 車両番号（値オブジェクト）
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 14 文字
    pub struct VehicleNo {
        label: "車両番号",
        max_length: 14,
    }
}

// =========================================================================
// FurnishName（申告対象者氏名）
// =========================================================================

define_validated_string! {
    /// 申告対象者氏名（値オブジェクト）
    ///
    /// 申告された賃借人・運転者の氏名。
    /// PII（個人識別情報）のため、Debug 出力はマスクされる。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    pub struct FurnishName {
        label: "申告対象者氏名",
        max_length: 100,
        pii: true,
    }
}

// =========================================================================
// FurnishIdNo（申告対象者 ID 番号）
// =========================================================================

define_validated_string! {
    /// 申告対象者 ID 番号（値オブジェクト）
    ///
    /// NRIC / FIN / パスポート番号 / UEN のいずれか。
    /// 形式の妥当性検証は自動承認チェック側の責務（ここでは長さのみ）。
    /// PII（個人識別情報）のため、Debug 出力はマスクされる。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 20 文字
    pub struct FurnishIdNo {
        label: "申告対象者ID番号",
        max_length: 20,
        pii: true,
    }
}

// =========================================================================
// テスト
// =========================================================================
