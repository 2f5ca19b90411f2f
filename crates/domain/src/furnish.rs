//! # 申告（furnish）ドメイン
//!
//! 違反通知書に対する「実際の賃借人・運転者は誰か」という
//! 車両所有者の申告（furnish）を管理するエンティティ群。
//!
//! ## エンティティ
//!
//! - [`FurnishApplication`] - 申告 1 回分のレコード（P→A / P→R の状態機械）
//! - [`OwnerDriver`] - 通知書ごとの現在の名宛人（賃借人 / 運転者）
//! - [`OwnerDriverAddr`] - 名宛人の住所（取得元ごとに 1 行）
//! - [`NoticeSuspension`] - TS-PDP サスペンション（21 日間の処理停止）

mod application;
mod owner_driver;
mod suspension;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

pub use application::{
    DecidedState,
    FurnishApplication,
    FurnishApplicationRecord,
    FurnishApplicationState,
    FurnishDocument,
    FurnishIdType,
    FurnishQuestionAnswers,
    FurnishStatus,
    MailingAddress,
    NewFurnishApplication,
    OwnerDriverIndicator,
    RejectionReasonCode,
    RentalPeriod,
};
pub use owner_driver::{
    AddressType,
    NewOwnerDriver,
    OwnerDriver,
    OwnerDriverAddr,
    OwnerDriverRecord,
};
pub use suspension::{
    NoticeSuspension,
    NoticeSuspensionRecord,
    SuspensionType,
    TS_PDP_SUSPENSION_DAYS,
};

/// 自動承認チェック種別
///
/// 申告受付時に評価される 5 つの業務ルール。
/// すべて合格した申告のみ審査担当官を経ずに自動承認される。
/// チェックは必ず 5 つすべて評価され、不合格の理由は全件が記録される。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoApprovalCheckType {
    /// ID 番号が申告された ID 種別の形式に合致すること
    IdentityFormat,
    /// 同一ロール（H/D）で承認済みの申告が存在しないこと
    ConflictingFurnish,
    /// 賃借人申告の場合、レンタル期間が違反日を含むこと
    RentalPeriodConsistency,
    /// 同一期間に複数の賃借人が存在しないこと
    SingleHirerPerPeriod,
    /// 申告対象者 ID が除外リストに載っていないこと
    ExclusionList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_チェック種別の文字列変換が正しい() {
        let check_str: &str = AutoApprovalCheckType::IdentityFormat.into();
        assert_eq!(check_str, "IDENTITY_FORMAT");

        assert_eq!(
            AutoApprovalCheckType::SingleHirerPerPeriod.to_string(),
            "SINGLE_HIRER_PER_PERIOD"
        );
    }
}
