//! # ダッシュボードユースケース
//!
//! 審査担当官が申告申請を一覧・照会するための読み取り専用プロジェクション。
//! 耐久状態は一切変更しない。
//!
//! ## 一覧
//!
//! ステータス指定があればその集合で候補行をロードし（なければ全件）、
//! インメモリの述語フィルタ（部分一致・申告日時の範囲）→ ソート →
//! ページネーションの順に適用する。
//!
//! ## 詳細
//!
//! 通知書の現在の処理ステージを解決し、申告からの経過営業日数
//! （土日のみ除外。祝日は考慮しない既知の制限がある）と
//! 添付書類メタデータを付加する。

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use noticeflow_domain::{
    clock::Clock,
    furnish::{FurnishApplication, FurnishStatus},
    value_objects::TxnNo,
};
use noticeflow_infra::repository::{
    FurnishApplicationRepository,
    FurnishDocumentRepository,
    NoticeRepository,
};
use noticeflow_shared::PaginatedResponse;
use serde::Serialize;

use crate::{error::CoreError, usecase::helpers::FindResultExt};

/// 一覧取得のフィルタ条件
#[derive(Debug, Clone, Default)]
pub struct ListFurnishApplicationsFilter {
    /// ステータス集合（None なら全件）
    pub statuses: Option<Vec<FurnishStatus>>,
    /// 通知書番号の部分一致
    pub notice_no: Option<String>,
    /// 車両番号の部分一致
    pub vehicle_no: Option<String>,
    /// 申告対象者 ID の部分一致
    pub furnish_id_no: Option<String>,
    /// 申告日時の下限（含む）
    pub submitted_from: Option<DateTime<Utc>>,
    /// 申告日時の上限（含む）
    pub submitted_to: Option<DateTime<Utc>>,
    /// ソートキー（未知のキーは申告日時降順にフォールバック）
    pub sort_by: Option<String>,
    /// ページ番号（1 始まり）
    pub page: u32,
    /// 1 ページあたりの件数
    pub page_size: u32,
}

/// 一覧用の申請サマリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FurnishApplicationSummary {
    pub txn_no: String,
    pub notice_no: String,
    pub vehicle_no: String,
    pub owner_driver_indicator: String,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl FurnishApplicationSummary {
    fn from_application(application: &FurnishApplication) -> Self {
        Self {
            txn_no: application.txn_no().to_string(),
            notice_no: application.notice_no().to_string(),
            vehicle_no: application.vehicle_no().to_string(),
            owner_driver_indicator: application.owner_driver_indicator().as_code().to_string(),
            status: application.status().as_code().to_string(),
            submitted_at: application.submitted_at(),
            decided_at: application.decided_at(),
        }
    }
}

/// 添付書類メタデータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FurnishDocumentMeta {
    pub reference:   String,
    pub file_name:   String,
    pub uploaded_at: DateTime<Utc>,
}

/// 詳細ビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FurnishApplicationDetail {
    pub txn_no: String,
    pub notice_no: String,
    pub vehicle_no: String,
    pub owner_driver_indicator: String,
    pub status: String,
    pub hirer_owner_relationship: Option<String>,
    pub remarks: String,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    /// 通知書の現在の処理ステージ（通知書が解決できない場合は None）
    pub processing_stage: Option<String>,
    /// 申告からの経過営業日数（土日のみ除外）
    pub working_days_pending: i64,
    pub documents: Vec<FurnishDocumentMeta>,
}

/// ダッシュボードユースケース実装
pub struct FurnishDashboardService {
    application_repo: Arc<dyn FurnishApplicationRepository>,
    notice_repo: Arc<dyn NoticeRepository>,
    document_repo: Arc<dyn FurnishDocumentRepository>,
    clock: Arc<dyn Clock>,
}

impl FurnishDashboardService {
    pub fn new(
        application_repo: Arc<dyn FurnishApplicationRepository>,
        notice_repo: Arc<dyn NoticeRepository>,
        document_repo: Arc<dyn FurnishDocumentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            application_repo,
            notice_repo,
            document_repo,
            clock,
        }
    }

    /// 申告申請を一覧取得する
    pub async fn list_furnish_applications(
        &self,
        filter: ListFurnishApplicationsFilter,
    ) -> Result<PaginatedResponse<FurnishApplicationSummary>, CoreError> {
        // 1. 候補行のロード
        let mut applications = match &filter.statuses {
            Some(statuses) if !statuses.is_empty() => {
                self.application_repo.find_by_statuses(statuses).await?
            }
            _ => self.application_repo.find_all().await?,
        };

        // 2. インメモリ述語フィルタ
        applications.retain(|a| matches_filter(a, &filter));

        // 3. ソート
        sort_applications(&mut applications, filter.sort_by.as_deref());

        // 4. ページネーション
        let page = filter.page.max(1);
        let page_size = filter.page_size.clamp(1, 100);
        let total_records = applications.len() as u64;
        let start = ((page - 1) as usize).saturating_mul(page_size as usize);

        let summaries = applications
            .iter()
            .skip(start)
            .take(page_size as usize)
            .map(FurnishApplicationSummary::from_application)
            .collect();

        Ok(PaginatedResponse::new(
            summaries,
            total_records,
            page,
            page_size,
        ))
    }

    /// 申告申請の詳細を取得する
    ///
    /// # エラー
    ///
    /// - `CoreError::NotFound`: 申請が存在しない場合
    pub async fn get_application_detail(
        &self,
        txn_no: &str,
    ) -> Result<FurnishApplicationDetail, CoreError> {
        let txn_no =
            TxnNo::new(txn_no).map_err(|e| CoreError::BadRequest(e.to_string()))?;

        let application = self
            .application_repo
            .find_by_txn_no(&txn_no)
            .await
            .or_not_found("申告申請")?;

        // 通知書の現在の処理ステージを解決する（欠損は致命的エラーにしない）
        let processing_stage = self
            .notice_repo
            .find_by_no(application.notice_no())
            .await?
            .map(|n| {
                let stage: &str = n.processing_stage().into();
                stage.to_string()
            });

        let now = self.clock.now();
        let working_days_pending =
            working_days_between(application.submitted_at().date_naive(), now.date_naive());

        let documents = self
            .document_repo
            .find_by_txn_no(&txn_no)
            .await?
            .into_iter()
            .map(|d| FurnishDocumentMeta {
                reference:   d.reference,
                file_name:   d.file_name,
                uploaded_at: d.uploaded_at,
            })
            .collect();

        Ok(FurnishApplicationDetail {
            txn_no: application.txn_no().to_string(),
            notice_no: application.notice_no().to_string(),
            vehicle_no: application.vehicle_no().to_string(),
            owner_driver_indicator: application.owner_driver_indicator().as_code().to_string(),
            status: application.status().as_code().to_string(),
            hirer_owner_relationship: application.hirer_owner_relationship().map(String::from),
            remarks: application.remarks().to_string(),
            submitted_at: application.submitted_at(),
            decided_at: application.decided_at(),
            processing_stage,
            working_days_pending,
            documents,
        })
    }
}

/// フィルタ条件に一致するか
fn matches_filter(application: &FurnishApplication, filter: &ListFurnishApplicationsFilter) -> bool {
    if let Some(q) = filter.notice_no.as_deref().filter(|q| !q.is_empty()) {
        if !application.notice_no().as_str().contains(q) {
            return false;
        }
    }
    if let Some(q) = filter.vehicle_no.as_deref().filter(|q| !q.is_empty()) {
        if !application.vehicle_no().as_str().contains(q) {
            return false;
        }
    }
    if let Some(q) = filter.furnish_id_no.as_deref().filter(|q| !q.is_empty()) {
        if !application.furnish_id_no().as_str().contains(q) {
            return false;
        }
    }
    if let Some(from) = filter.submitted_from {
        if application.submitted_at() < from {
            return false;
        }
    }
    if let Some(to) = filter.submitted_to {
        if application.submitted_at() > to {
            return false;
        }
    }
    true
}

/// ソートキーを適用する
///
/// 未知のキー・指定なしは申告日時の降順（固定フォールバック）。
/// 同値の場合も申告日時降順で安定させる。
fn sort_applications(applications: &mut [FurnishApplication], sort_by: Option<&str>) {
    match sort_by {
        Some("notice_no") => applications.sort_by(|a, b| {
            a.notice_no()
                .as_str()
                .cmp(b.notice_no().as_str())
                .then_with(|| b.submitted_at().cmp(&a.submitted_at()))
        }),
        Some("vehicle_no") => applications.sort_by(|a, b| {
            a.vehicle_no()
                .as_str()
                .cmp(b.vehicle_no().as_str())
                .then_with(|| b.submitted_at().cmp(&a.submitted_at()))
        }),
        Some("status") => applications.sort_by(|a, b| {
            a.status()
                .as_code()
                .cmp(b.status().as_code())
                .then_with(|| b.submitted_at().cmp(&a.submitted_at()))
        }),
        _ => applications.sort_by(|a, b| b.submitted_at().cmp(&a.submitted_at())),
    }
}

/// 経過営業日数を数える（`from` の翌日から `to` まで、土日を除外）
///
/// 祝日は考慮しない（既知の制限）。同日なら 0。
fn working_days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let mut days = 0;
    let mut current = from;
    while current < to {
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            days += 1;
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use noticeflow_domain::{
        clock::FixedClock,
        furnish::{
            FurnishIdType,
            FurnishQuestionAnswers,
            MailingAddress,
            NewFurnishApplication,
            OwnerDriverIndicator,
        },
        value_objects::{FurnishIdNo, FurnishName, NoticeNo, TxnNo, VehicleNo},
    };
    use noticeflow_infra::mock::{
        MockFurnishApplicationRepository,
        MockFurnishDocumentRepository,
        MockNoticeRepository,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_application(
        txn_no: &str,
        notice_no: &str,
        vehicle_no: &str,
        submitted_at: DateTime<Utc>,
    ) -> FurnishApplication {
        FurnishApplication::new(NewFurnishApplication {
            txn_no: TxnNo::new(txn_no).unwrap(),
            notice_no: NoticeNo::new(notice_no).unwrap(),
            vehicle_no: VehicleNo::new(vehicle_no).unwrap(),
            offence_date: date(2024, 3, 1),
            furnish_name: FurnishName::new("Tan Ah Kow").unwrap(),
            furnish_id_type: FurnishIdType::Nric,
            furnish_id_no: FurnishIdNo::new("S1234567D").unwrap(),
            owner_driver_indicator: OwnerDriverIndicator::Driver,
            hirer_owner_relationship: None,
            mailing_address: MailingAddress {
                block_no:      "123".to_string(),
                street_name:   "Orchard Road".to_string(),
                floor_no:      None,
                unit_no:       None,
                building_name: None,
                postal_code:   "238888".to_string(),
            },
            email: None,
            phone: None,
            question_answers: FurnishQuestionAnswers {
                question_1: String::new(),
                question_2: String::new(),
                question_3: String::new(),
            },
            rental_period: None,
            now: submitted_at,
        })
    }

    fn build_sut(
        application_repo: &MockFurnishApplicationRepository,
        notice_repo: &MockNoticeRepository,
        document_repo: &MockFurnishDocumentRepository,
        now: DateTime<Utc>,
    ) -> FurnishDashboardService {
        FurnishDashboardService::new(
            Arc::new(application_repo.clone()),
            Arc::new(notice_repo.clone()),
            Arc::new(document_repo.clone()),
            Arc::new(FixedClock::new(now)),
        )
    }

    // ===== working_days_between =====

    #[rstest]
    // 2024-03-01 は金曜日
    #[case(date(2024, 3, 1), date(2024, 3, 1), 0, "同日")]
    #[case(date(2024, 3, 1), date(2024, 3, 4), 1, "金曜→月曜は土日を除いて1")]
    #[case(date(2024, 3, 1), date(2024, 3, 2), 0, "金曜→土曜は0")]
    #[case(date(2024, 3, 1), date(2024, 3, 8), 5, "金曜→翌金曜は5営業日")]
    #[case(date(2024, 3, 4), date(2024, 3, 5), 1, "月曜→火曜は1")]
    fn test_経過営業日数(
        #[case] from: NaiveDate,
        #[case] to: NaiveDate,
        #[case] expected: i64,
        #[case] _desc: &str,
    ) {
        assert_eq!(working_days_between(from, to), expected);
    }

    // ===== list_furnish_applications =====

    fn submitted(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn seed_three(repo: &MockFurnishApplicationRepository) {
        repo.add_application(make_application(
            "FRN-0001",
            "N2024-000100",
            "SGA1111A",
            submitted(1, 9),
        ));
        repo.add_application(make_application(
            "FRN-0002",
            "N2024-000200",
            "SGB2222B",
            submitted(2, 9),
        ));
        let approved =
            make_application("FRN-0003", "N2024-000300", "SGC3333C", submitted(3, 9))
                .approved(submitted(4, 9))
                .unwrap();
        repo.add_application(approved);
    }

    #[tokio::test]
    async fn test_一覧_既定は申告日時降順() {
        let application_repo = MockFurnishApplicationRepository::new();
        seed_three(&application_repo);
        let sut = build_sut(
            &application_repo,
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let page = sut
            .list_furnish_applications(ListFurnishApplicationsFilter {
                page: 1,
                page_size: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_records, 3);
        assert_eq!(page.total_pages, 1);
        let txn_nos: Vec<&str> = page.data.iter().map(|s| s.txn_no.as_str()).collect();
        assert_eq!(txn_nos, vec!["FRN-0003", "FRN-0002", "FRN-0001"]);
    }

    #[tokio::test]
    async fn test_一覧_ステータス集合で絞り込む() {
        let application_repo = MockFurnishApplicationRepository::new();
        seed_three(&application_repo);
        let sut = build_sut(
            &application_repo,
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let page = sut
            .list_furnish_applications(ListFurnishApplicationsFilter {
                statuses: Some(vec![FurnishStatus::Approved]),
                page: 1,
                page_size: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_records, 1);
        assert_eq!(page.data[0].txn_no, "FRN-0003");
        assert_eq!(page.data[0].status, "A");
    }

    #[tokio::test]
    async fn test_一覧_通知書番号の部分一致() {
        let application_repo = MockFurnishApplicationRepository::new();
        seed_three(&application_repo);
        let sut = build_sut(
            &application_repo,
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let page = sut
            .list_furnish_applications(ListFurnishApplicationsFilter {
                notice_no: Some("000200".to_string()),
                page: 1,
                page_size: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_records, 1);
        assert_eq!(page.data[0].notice_no, "N2024-000200");
    }

    #[tokio::test]
    async fn test_一覧_申告日時の範囲フィルタ() {
        let application_repo = MockFurnishApplicationRepository::new();
        seed_three(&application_repo);
        let sut = build_sut(
            &application_repo,
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let page = sut
            .list_furnish_applications(ListFurnishApplicationsFilter {
                submitted_from: Some(submitted(2, 0)),
                submitted_to: Some(submitted(2, 23)),
                page: 1,
                page_size: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_records, 1);
        assert_eq!(page.data[0].txn_no, "FRN-0002");
    }

    #[tokio::test]
    async fn test_一覧_未知のソートキーは申告日時降順にフォールバック() {
        let application_repo = MockFurnishApplicationRepository::new();
        seed_three(&application_repo);
        let sut = build_sut(
            &application_repo,
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let page = sut
            .list_furnish_applications(ListFurnishApplicationsFilter {
                sort_by: Some("unknown_key".to_string()),
                page: 1,
                page_size: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        let txn_nos: Vec<&str> = page.data.iter().map(|s| s.txn_no.as_str()).collect();
        assert_eq!(txn_nos, vec!["FRN-0003", "FRN-0002", "FRN-0001"]);
    }

    #[tokio::test]
    async fn test_一覧_通知書番号ソート() {
        let application_repo = MockFurnishApplicationRepository::new();
        seed_three(&application_repo);
        let sut = build_sut(
            &application_repo,
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let page = sut
            .list_furnish_applications(ListFurnishApplicationsFilter {
                sort_by: Some("notice_no".to_string()),
                page: 1,
                page_size: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        let notice_nos: Vec<&str> = page.data.iter().map(|s| s.notice_no.as_str()).collect();
        assert_eq!(
            notice_nos,
            vec!["N2024-000100", "N2024-000200", "N2024-000300"]
        );
    }

    #[tokio::test]
    async fn test_一覧_ページネーションの件数計算() {
        let application_repo = MockFurnishApplicationRepository::new();
        seed_three(&application_repo);
        let sut = build_sut(
            &application_repo,
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let page = sut
            .list_furnish_applications(ListFurnishApplicationsFilter {
                page: 2,
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_records, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].txn_no, "FRN-0001");
    }

    // ===== get_application_detail =====

    #[tokio::test]
    async fn test_詳細_存在しないtxn_noはnot_found() {
        let sut = build_sut(
            &MockFurnishApplicationRepository::new(),
            &MockNoticeRepository::new(),
            &MockFurnishDocumentRepository::new(),
            submitted(10, 9),
        );

        let result = sut.get_application_detail("FRN-UNKNOWN").await;

        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_詳細_経過営業日数と処理ステージが付加される() {
        use noticeflow_domain::notice::{NewNotice, Notice, NoticeProcessingStage};

        let application_repo = MockFurnishApplicationRepository::new();
        let notice_repo = MockNoticeRepository::new();
        let document_repo = MockFurnishDocumentRepository::new();

        // 金曜（2024-03-01）申告
        application_repo.add_application(make_application(
            "FRN-0001",
            "N2024-000100",
            "SGA1111A",
            submitted(1, 9),
        ));
        notice_repo.add_notice(Notice::new(NewNotice {
            notice_no: NoticeNo::new("N2024-000100").unwrap(),
            vehicle_no: VehicleNo::new("SGA1111A").unwrap(),
            offence_date: date(2024, 2, 20),
            processing_stage: NoticeProcessingStage::Suspended,
            owner_name: None,
            owner_email: None,
            issued_at: submitted(1, 9),
        }));

        // 翌月曜（2024-03-04）に照会
        let sut = build_sut(&application_repo, &notice_repo, &document_repo, submitted(4, 9));

        let detail = sut.get_application_detail("FRN-0001").await.unwrap();

        assert_eq!(detail.working_days_pending, 1);
        assert_eq!(detail.processing_stage.as_deref(), Some("suspended"));
        assert!(detail.documents.is_empty());
    }
}
