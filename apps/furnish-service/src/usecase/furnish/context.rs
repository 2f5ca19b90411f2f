//! # FurnishContext（申告受付の作業単位）
//!
//! 受付パイプライン 1 回分を通して持ち回される可変コンテキスト。
//! リクエスト・パイプライン開始時に読んだスナップショット・
//! 生成されたエンティティ・チェック結果を集約する。
//!
//! 1 リクエスト = 1 コンテキストで、リクエスト間で共有されることはない。

use itertools::Itertools;
use noticeflow_domain::{
    furnish::{
        AutoApprovalCheckType,
        FurnishApplication,
        FurnishIdType,
        OwnerDriver,
        OwnerDriverIndicator,
        RentalPeriod,
    },
    notice::Notice,
    value_objects::{FurnishIdNo, FurnishName, NoticeNo, VehicleNo},
};

use super::SubmissionInput;

/// 構造検証を通過した申告リクエストの型付き表現
///
/// [`super::FurnishValidator::validate_basic_business_rules`] の成功時に
/// 構築され、以降のステップは生文字列ではなくこちらを参照する。
#[derive(Debug, Clone)]
pub struct ParsedFurnishRequest {
    pub notice_no: NoticeNo,
    pub vehicle_no: VehicleNo,
    pub furnish_name: FurnishName,
    pub furnish_id_type: FurnishIdType,
    pub furnish_id_no: FurnishIdNo,
    pub owner_driver_indicator: OwnerDriverIndicator,
    pub rental_period: Option<RentalPeriod>,
}

/// 不合格となった自動承認チェック（種別 + 人間可読な理由）
#[derive(Debug, Clone)]
pub struct FailedCheck {
    pub check_type: AutoApprovalCheckType,
    pub message:    String,
}

/// 申告受付パイプラインの可変コンテキスト
///
/// リクエストスコープで 1 パイプライン実行が排他的に所有する。
/// 永続化はしない。PII を含むため `Debug` は実装しない。
pub struct FurnishContext {
    /// eService から受け取ったリクエスト
    pub request: SubmissionInput,
    /// パイプライン開始時に読んだ通知書スナップショット
    pub notice: Option<Notice>,
    /// 同一通知書の既存申請スナップショット
    pub existing_applications: Vec<FurnishApplication>,
    /// 同一通知書の既存名宛人スナップショット
    pub existing_owner_drivers: Vec<OwnerDriver>,
    /// 申告対象者 ID が除外リストに載っているか（コンテキスト構築時に解決）
    pub furnished_id_excluded: bool,
    /// 構造検証を通過した型付きリクエスト
    pub parsed: Option<ParsedFurnishRequest>,
    /// 作成された申告申請
    pub application: Option<FurnishApplication>,
    /// 自動承認で作成された名宛人
    pub owner_driver: Option<OwnerDriver>,
    /// 不合格チェックの順序付きリスト（0〜5 件）
    pub failed_checks: Vec<FailedCheck>,
    /// 同一通知書への再申告か（情報提供のみ。再申告は拒否しない）
    pub is_resubmission: bool,
    /// 5 チェックすべて合格したか
    pub auto_approval_passed: bool,
    /// 名宛人レコードを作成したか
    pub owner_driver_record_created: bool,
    /// TS-PDP サスペンションを適用済みか
    pub suspension_applied: bool,
}

impl FurnishContext {
    /// リクエストから新しいコンテキストを構築する
    pub fn new(request: SubmissionInput) -> Self {
        Self {
            request,
            notice: None,
            existing_applications: Vec::new(),
            existing_owner_drivers: Vec::new(),
            furnished_id_excluded: false,
            parsed: None,
            application: None,
            owner_driver: None,
            failed_checks: Vec::new(),
            is_resubmission: false,
            auto_approval_passed: false,
            owner_driver_record_created: false,
            suspension_applied: false,
        }
    }

    /// 不合格チェックの種別一覧を返す
    pub fn failed_check_types(&self) -> Vec<AutoApprovalCheckType> {
        self.failed_checks.iter().map(|f| f.check_type).collect()
    }

    /// 不合格理由を審査担当官向けに連結した文字列を返す
    ///
    /// 全チェックの結果を一度に提示するため、件数分すべて含まれる。
    pub fn failure_reasons_joined(&self) -> String {
        self.failed_checks
            .iter()
            .map(|f| format!("{}: {}", f.check_type, f.message))
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use noticeflow_domain::furnish::AutoApprovalCheckType;

    use super::*;
    use crate::usecase::furnish::MailingAddressInput;

    fn make_input() -> SubmissionInput {
        SubmissionInput {
            notice_no: "N2024-000123".to_string(),
            vehicle_no: "SGX1234A".to_string(),
            furnish_name: "Tan Ah Kow".to_string(),
            furnish_id_type: "NRIC".to_string(),
            furnish_id_no: "S1234567D".to_string(),
            owner_driver_indicator: "D".to_string(),
            hirer_owner_relationship: None,
            mailing_address: MailingAddressInput {
                block_no:      "123".to_string(),
                street_name:   "Orchard Road".to_string(),
                floor_no:      None,
                unit_no:       None,
                building_name: None,
                postal_code:   "238888".to_string(),
            },
            email: None,
            phone: None,
            question_1: String::new(),
            question_2: String::new(),
            question_3: String::new(),
            rental_start: None,
            rental_end: None,
            document_refs: Vec::new(),
        }
    }

    #[test]
    fn test_新規コンテキストの初期フラグはすべてfalse() {
        let ctx = FurnishContext::new(make_input());

        assert!(!ctx.is_resubmission);
        assert!(!ctx.auto_approval_passed);
        assert!(!ctx.owner_driver_record_created);
        assert!(!ctx.suspension_applied);
        assert!(ctx.failed_checks.is_empty());
    }

    #[test]
    fn test_不合格理由の連結は全件を含む() {
        let mut ctx = FurnishContext::new(make_input());
        ctx.failed_checks = vec![
            FailedCheck {
                check_type: AutoApprovalCheckType::IdentityFormat,
                message:    "ID 形式不正".to_string(),
            },
            FailedCheck {
                check_type: AutoApprovalCheckType::ExclusionList,
                message:    "除外リスト登録済み".to_string(),
            },
        ];

        let joined = ctx.failure_reasons_joined();

        assert_eq!(
            joined,
            "IDENTITY_FORMAT: ID 形式不正; EXCLUSION_LIST: 除外リスト登録済み"
        );
        assert_eq!(
            ctx.failed_check_types(),
            vec![
                AutoApprovalCheckType::IdentityFormat,
                AutoApprovalCheckType::ExclusionList,
            ]
        );
    }
}
