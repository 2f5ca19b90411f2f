//! # FurnishValidator（申告ルール評価）
//!
//! ステートレスなルール評価器。コンテキストのスナップショットのみを参照し、
//! I/O・副作用を一切持たない。
//!
//! - [`validate_basic_business_rules`](FurnishValidator::validate_basic_business_rules):
//!   構造検証。最初の違反で打ち切り、違反内容を返す
//! - [`perform_auto_approval_checks`](FurnishValidator::perform_auto_approval_checks):
//!   5 つの自動承認チェック。短絡せず必ず全件評価し、コンテキストに
//!   結果を記録する（戻り値なし）

use std::str::FromStr;

use noticeflow_domain::furnish::{
    AutoApprovalCheckType,
    FurnishIdType,
    FurnishStatus,
    OwnerDriverIndicator,
    RentalPeriod,
};
use noticeflow_domain::value_objects::{FurnishIdNo, FurnishName, NoticeNo, VehicleNo};

use super::context::{FailedCheck, FurnishContext, ParsedFurnishRequest};

/// 構造検証の違反内容
#[derive(Debug, Clone)]
pub struct BasicRuleViolation {
    /// 違反したフィールド名
    pub field:   &'static str,
    /// 人間可読な違反理由
    pub message: String,
}

impl BasicRuleViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// 申告ルール評価器（ステートレス）
pub struct FurnishValidator;

impl FurnishValidator {
    /// 基本ビジネスルールを検証する
    ///
    /// 通知書の存在・申告可能ステージ・ペイロードの内部整合性を確認し、
    /// 成功時は型付きリクエストを返す。最初の違反で打ち切る
    /// （同期・副作用なし。永続化は一切発生していない段階で呼ばれる）。
    pub fn validate_basic_business_rules(
        ctx: &FurnishContext,
    ) -> Result<ParsedFurnishRequest, BasicRuleViolation> {
        let request = &ctx.request;

        // 1. 通知書の存在
        let Some(notice) = &ctx.notice else {
            return Err(BasicRuleViolation::new(
                "notice_no",
                format!("通知書が見つかりません: {}", request.notice_no.trim()),
            ));
        };

        // 2. 申告可能な処理ステージか
        if !notice.processing_stage().is_furnishable() {
            return Err(BasicRuleViolation::new(
                "notice_no",
                format!(
                    "現在の処理ステージでは申告を受け付けられません（{}）",
                    notice.processing_stage()
                ),
            ));
        }

        let notice_no = NoticeNo::new(request.notice_no.clone())
            .map_err(|e| BasicRuleViolation::new("notice_no", e.to_string()))?;

        // 3. 車両番号の形式と通知書との一致
        let vehicle_no = VehicleNo::new(request.vehicle_no.clone())
            .map_err(|e| BasicRuleViolation::new("vehicle_no", e.to_string()))?;
        if &vehicle_no != notice.vehicle_no() {
            return Err(BasicRuleViolation::new(
                "vehicle_no",
                "申告された車両番号が通知書と一致しません",
            ));
        }

        // 4. 名宛人区分（H / D）
        let owner_driver_indicator =
            OwnerDriverIndicator::from_str(request.owner_driver_indicator.trim())
                .map_err(|e| BasicRuleViolation::new("owner_driver_indicator", e.to_string()))?;

        // 5. ID 種別と必須の本人確認フィールド
        let furnish_id_type = FurnishIdType::from_str(request.furnish_id_type.trim())
            .map_err(|e| BasicRuleViolation::new("furnish_id_type", e.to_string()))?;
        let furnish_id_no = FurnishIdNo::new(request.furnish_id_no.clone())
            .map_err(|e| BasicRuleViolation::new("furnish_id_no", e.to_string()))?;
        let furnish_name = FurnishName::new(request.furnish_name.clone())
            .map_err(|e| BasicRuleViolation::new("furnish_name", e.to_string()))?;

        // 6. レンタル期間のペア整合性（開始・終了は両方指定か両方省略）
        let rental_period = match (request.rental_start, request.rental_end) {
            (Some(start), Some(end)) => Some(
                RentalPeriod::new(start, end)
                    .map_err(|e| BasicRuleViolation::new("rental_period", e.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(BasicRuleViolation::new(
                    "rental_period",
                    "レンタル期間は開始日・終了日の両方を指定する必要があります",
                ));
            }
        };

        Ok(ParsedFurnishRequest {
            notice_no,
            vehicle_no,
            furnish_name,
            furnish_id_type,
            furnish_id_no,
            owner_driver_indicator,
            rental_period,
        })
    }

    /// 5 つの自動承認チェックを実行する
    ///
    /// 不合格があっても短絡せず、必ず 5 件すべて評価する。
    /// 審査担当官が全理由を一度に確認できるようにするため。
    /// 結果はコンテキストにのみ記録し、戻り値は持たない。
    /// 呼び出し順序（構造検証の通過後）は受付パイプラインが保証する。
    pub fn perform_auto_approval_checks(ctx: &mut FurnishContext) {
        let Some(parsed) = ctx.parsed.clone() else {
            ctx.auto_approval_passed = false;
            return;
        };

        let mut failed_checks = Vec::new();

        // チェック 1: ID 番号の形式
        if !parsed
            .furnish_id_type
            .matches_format(parsed.furnish_id_no.as_str())
        {
            let id_type: &str = parsed.furnish_id_type.into();
            failed_checks.push(FailedCheck {
                check_type: AutoApprovalCheckType::IdentityFormat,
                message:    format!("ID 番号が {} の形式に合致しません", id_type),
            });
        }

        // チェック 2: 同一ロールの承認済み申告との競合
        if ctx.existing_applications.iter().any(|a| {
            a.status() == FurnishStatus::Approved
                && a.owner_driver_indicator() == parsed.owner_driver_indicator
        }) {
            failed_checks.push(FailedCheck {
                check_type: AutoApprovalCheckType::ConflictingFurnish,
                message:    format!(
                    "同一ロール（{}）で承認済みの申告が既に存在します",
                    parsed.owner_driver_indicator
                ),
            });
        }

        // チェック 3: レンタル期間の整合性（賃借人申告のみ）
        if parsed.owner_driver_indicator == OwnerDriverIndicator::Hirer {
            match (&parsed.rental_period, &ctx.notice) {
                (Some(period), Some(notice)) if !period.contains(notice.offence_date()) => {
                    failed_checks.push(FailedCheck {
                        check_type: AutoApprovalCheckType::RentalPeriodConsistency,
                        message:    format!(
                            "レンタル期間が違反日（{}）を含んでいません",
                            notice.offence_date()
                        ),
                    });
                }
                (None, _) => {
                    failed_checks.push(FailedCheck {
                        check_type: AutoApprovalCheckType::RentalPeriodConsistency,
                        message:    "賃借人申告にはレンタル期間が必要です".to_string(),
                    });
                }
                _ => {}
            }
        }

        // チェック 4: 同一期間に複数の賃借人が存在しないこと
        if parsed.owner_driver_indicator == OwnerDriverIndicator::Hirer {
            if let Some(period) = &parsed.rental_period {
                let overlapping_hirer = ctx.existing_applications.iter().any(|a| {
                    a.status() == FurnishStatus::Approved
                        && a.owner_driver_indicator() == OwnerDriverIndicator::Hirer
                        && a.rental_period().is_some_and(|p| p.overlaps(period))
                });
                if overlapping_hirer {
                    failed_checks.push(FailedCheck {
                        check_type: AutoApprovalCheckType::SingleHirerPerPeriod,
                        message:    "同一期間に別の賃借人の承認済み申告が存在します".to_string(),
                    });
                }
            }
        }

        // チェック 5: 除外リスト
        if ctx.furnished_id_excluded {
            failed_checks.push(FailedCheck {
                check_type: AutoApprovalCheckType::ExclusionList,
                message:    "申告対象者 ID が除外リストに登録されています".to_string(),
            });
        }

        ctx.failed_checks = failed_checks;
        ctx.auto_approval_passed = ctx.failed_checks.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use noticeflow_domain::{
        furnish::{
            FurnishApplication,
            FurnishQuestionAnswers,
            MailingAddress,
            NewFurnishApplication,
        },
        notice::{NewNotice, Notice, NoticeProcessingStage},
        value_objects::TxnNo,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::usecase::furnish::{MailingAddressInput, SubmissionInput};

    fn offence_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn make_notice(stage: NoticeProcessingStage) -> Notice {
        Notice::new(NewNotice {
            notice_no: NoticeNo::new("N2024-000123").unwrap(),
            vehicle_no: VehicleNo::new("SGX1234A").unwrap(),
            offence_date: offence_date(),
            processing_stage: stage,
            owner_name: Some("Ong Teck Huat".to_string()),
            owner_email: Some("owner@example.com".to_string()),
            issued_at: Utc::now(),
        })
    }

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
            question_1: "業務利用".to_string(),
            question_2: "従業員".to_string(),
            question_3: String::new(),
            rental_start: None,
            rental_end: None,
            document_refs: Vec::new(),
        }
    }

    fn make_context(input: SubmissionInput, notice: Option<Notice>) -> FurnishContext {
        let mut ctx = FurnishContext::new(input);
        ctx.notice = notice;
        ctx
    }

    /// 承認済みの既存申請を作成するヘルパー
    fn approved_application(
        indicator: OwnerDriverIndicator,
        rental_period: Option<RentalPeriod>,
    ) -> FurnishApplication {
        let now = Utc::now();
        FurnishApplication::new(NewFurnishApplication {
            txn_no: TxnNo::generate(),
            notice_no: NoticeNo::new("N2024-000123").unwrap(),
            vehicle_no: VehicleNo::new("SGX1234A").unwrap(),
            offence_date: offence_date(),
            furnish_name: FurnishName::new("Lim Bee Leng").unwrap(),
            furnish_id_type: FurnishIdType::Nric,
            furnish_id_no: FurnishIdNo::new("S7654321B").unwrap(),
            owner_driver_indicator: indicator,
            hirer_owner_relationship: None,
            mailing_address: MailingAddress {
                block_no:      "1".to_string(),
                street_name:   "Raffles Place".to_string(),
                floor_no:      None,
                unit_no:       None,
                building_name: None,
                postal_code:   "048616".to_string(),
            },
            email: None,
            phone: None,
            question_answers: FurnishQuestionAnswers {
                question_1: String::new(),
                question_2: String::new(),
                question_3: String::new(),
            },
            rental_period,
            now,
        })
        .approved(now)
        .unwrap()
    }

    // ===== validate_basic_business_rules =====

    #[test]
    fn test_基本検証_正常系() {
        let ctx = make_context(make_input(), Some(make_notice(NoticeProcessingStage::Issued)));

        let parsed = FurnishValidator::validate_basic_business_rules(&ctx).unwrap();

        assert_eq!(parsed.notice_no.as_str(), "N2024-000123");
        assert_eq!(
            parsed.owner_driver_indicator,
            OwnerDriverIndicator::Driver
        );
        assert!(parsed.rental_period.is_none());
    }

    #[test]
    fn test_基本検証_通知書が存在しない場合は違反() {
        let ctx = make_context(make_input(), None);

        let violation = FurnishValidator::validate_basic_business_rules(&ctx).unwrap_err();

        assert_eq!(violation.field, "notice_no");
        assert!(violation.message.contains("見つかりません"));
    }

    #[test]
    fn test_基本検証_申告不可ステージは違反() {
        let ctx = make_context(
            make_input(),
            Some(make_notice(NoticeProcessingStage::SummonsIssued)),
        );

        let violation = FurnishValidator::validate_basic_business_rules(&ctx).unwrap_err();

        assert_eq!(violation.field, "notice_no");
        assert!(violation.message.contains("受け付けられません"));
    }

    #[test]
    fn test_基本検証_車両番号不一致は違反() {
        let mut input = make_input();
        input.vehicle_no = "SGZ9999Z".to_string();
        let ctx = make_context(input, Some(make_notice(NoticeProcessingStage::Issued)));

        let violation = FurnishValidator::validate_basic_business_rules(&ctx).unwrap_err();

        assert_eq!(violation.field, "vehicle_no");
    }

    #[test]
    fn test_基本検証_不正な名宛人区分は違反() {
        let mut input = make_input();
        input.owner_driver_indicator = "X".to_string();
        let ctx = make_context(input, Some(make_notice(NoticeProcessingStage::Issued)));

        let violation = FurnishValidator::validate_basic_business_rules(&ctx).unwrap_err();

        assert_eq!(violation.field, "owner_driver_indicator");
    }

    #[test]
    fn test_基本検証_id番号未入力は違反() {
        let mut input = make_input();
        input.furnish_id_no = "   ".to_string();
        let ctx = make_context(input, Some(make_notice(NoticeProcessingStage::Issued)));

        let violation = FurnishValidator::validate_basic_business_rules(&ctx).unwrap_err();

        assert_eq!(violation.field, "furnish_id_no");
    }

    #[test]
    fn test_基本検証_レンタル期間の片側のみ指定は違反() {
        let mut input = make_input();
        input.rental_start = Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let ctx = make_context(input, Some(make_notice(NoticeProcessingStage::Issued)));

        let violation = FurnishValidator::validate_basic_business_rules(&ctx).unwrap_err();

        assert_eq!(violation.field, "rental_period");
    }

    // ===== perform_auto_approval_checks =====

    /// 構造検証を通過させた上でコンテキストを返すヘルパー
    fn validated_context(input: SubmissionInput, notice: Notice) -> FurnishContext {
        let mut ctx = make_context(input, Some(notice));
        let parsed = FurnishValidator::validate_basic_business_rules(&ctx).unwrap();
        ctx.parsed = Some(parsed);
        ctx
    }

    #[test]
    fn test_自動承認チェック_全件合格() {
        let mut ctx = validated_context(make_input(), make_notice(NoticeProcessingStage::Issued));

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert!(ctx.auto_approval_passed);
        assert_eq!(ctx.failed_checks.len(), 0);
    }

    #[test]
    fn test_自動承認チェック_id形式不正は不合格() {
        let mut input = make_input();
        // 長さ・文字種は FurnishIdNo として妥当だが NRIC 形式ではない
        input.furnish_id_no = "X9999999".to_string();
        let mut ctx = validated_context(input, make_notice(NoticeProcessingStage::Issued));

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert!(!ctx.auto_approval_passed);
        assert_eq!(
            ctx.failed_check_types(),
            vec![AutoApprovalCheckType::IdentityFormat]
        );
    }

    #[test]
    fn test_自動承認チェック_同一ロールの承認済み申告があれば不合格() {
        let mut ctx = validated_context(make_input(), make_notice(NoticeProcessingStage::Issued));
        ctx.existing_applications =
            vec![approved_application(OwnerDriverIndicator::Driver, None)];

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert_eq!(
            ctx.failed_check_types(),
            vec![AutoApprovalCheckType::ConflictingFurnish]
        );
    }

    #[test]
    fn test_自動承認チェック_別ロールの承認済み申告は競合しない() {
        let mut ctx = validated_context(make_input(), make_notice(NoticeProcessingStage::Issued));
        ctx.existing_applications =
            vec![approved_application(OwnerDriverIndicator::Hirer, None)];

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert!(ctx.auto_approval_passed);
    }

    #[test]
    fn test_自動承認チェック_賃借人でレンタル期間なしは不合格() {
        let mut input = make_input();
        input.owner_driver_indicator = "H".to_string();
        let mut ctx = validated_context(input, make_notice(NoticeProcessingStage::Issued));

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert_eq!(
            ctx.failed_check_types(),
            vec![AutoApprovalCheckType::RentalPeriodConsistency]
        );
    }

    #[test]
    fn test_自動承認チェック_レンタル期間が違反日を含まないと不合格() {
        let mut input = make_input();
        input.owner_driver_indicator = "H".to_string();
        input.rental_start = Some(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        input.rental_end = Some(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        let mut ctx = validated_context(input, make_notice(NoticeProcessingStage::Issued));

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert_eq!(
            ctx.failed_check_types(),
            vec![AutoApprovalCheckType::RentalPeriodConsistency]
        );
    }

    #[test]
    fn test_自動承認チェック_期間重複する賃借人がいると不合格() {
        let mut input = make_input();
        input.owner_driver_indicator = "H".to_string();
        input.rental_start = Some(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        input.rental_end = Some(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let mut ctx = validated_context(input, make_notice(NoticeProcessingStage::Issued));

        let existing_period = RentalPeriod::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap();
        ctx.existing_applications = vec![approved_application(
            OwnerDriverIndicator::Hirer,
            Some(existing_period),
        )];

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        // 同一ロール競合と期間重複の両方が検出される
        assert_eq!(
            ctx.failed_check_types(),
            vec![
                AutoApprovalCheckType::ConflictingFurnish,
                AutoApprovalCheckType::SingleHirerPerPeriod,
            ]
        );
    }

    #[test]
    fn test_自動承認チェック_除外リスト登録済みは不合格() {
        let mut ctx = validated_context(make_input(), make_notice(NoticeProcessingStage::Issued));
        ctx.furnished_id_excluded = true;

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert_eq!(
            ctx.failed_check_types(),
            vec![AutoApprovalCheckType::ExclusionList]
        );
    }

    #[test]
    fn test_自動承認チェック_最初の不合格で短絡しない() {
        // ID 形式不正 + レンタル期間なし（賃借人）の 2 件が両方記録される
        let mut input = make_input();
        input.owner_driver_indicator = "H".to_string();
        input.furnish_id_no = "X9999999".to_string();
        let mut ctx = validated_context(input, make_notice(NoticeProcessingStage::Issued));

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert!(!ctx.auto_approval_passed);
        assert_eq!(
            ctx.failed_check_types(),
            vec![
                AutoApprovalCheckType::IdentityFormat,
                AutoApprovalCheckType::RentalPeriodConsistency,
            ]
        );
    }

    #[test]
    fn test_自動承認チェック_5件すべて不合格になりうる() {
        let mut input = make_input();
        input.owner_driver_indicator = "H".to_string();
        input.furnish_id_no = "X9999999".to_string();
        input.rental_start = Some(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        input.rental_end = Some(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        let mut ctx = validated_context(input, make_notice(NoticeProcessingStage::Issued));

        let overlapping_period = RentalPeriod::new(
            NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        )
        .unwrap();
        ctx.existing_applications = vec![approved_application(
            OwnerDriverIndicator::Hirer,
            Some(overlapping_period),
        )];
        ctx.furnished_id_excluded = true;

        FurnishValidator::perform_auto_approval_checks(&mut ctx);

        assert_eq!(ctx.failed_checks.len(), 5);
        assert!(!ctx.auto_approval_passed);
    }
}
