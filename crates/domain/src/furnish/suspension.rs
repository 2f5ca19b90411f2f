//! # TS-PDP サスペンション
//!
//! 申告の審査が完了するまで通知書の処理時計を止める、
//! 期限付きの処理停止レコード。
//!
//! 申告の受付（自動承認・審査待ちを問わず）で必ず適用され、
//! 解除（revive）されるのは承認の処分時のみ。却下では解除しない。
//! 却下後も処理停止が続くことで、所有者は処理時計と競合せずに
//! eService から再申告できる。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, value_objects::NoticeNo};

/// TS-PDP サスペンションの停止期間（日数）
pub const TS_PDP_SUSPENSION_DAYS: i64 = 21;

/// サスペンション種別
///
/// 本サービスが扱うのは TS-PDP のみだが、`notice_suspensions` テーブルは
/// 他の停止種別と共用のためコードを保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuspensionType {
    /// 申告審査中の処理停止（Temporary Suspension - Pending Disposition）
    #[serde(rename = "TS-PDP")]
    TsPdp,
}

impl SuspensionType {
    /// DB 格納用のコードを返す
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::TsPdp => "TS-PDP",
        }
    }
}

impl std::str::FromStr for SuspensionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TS-PDP" => Ok(Self::TsPdp),
            _ => Err(DomainError::Validation(format!(
                "不正なサスペンション種別: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SuspensionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// 通知書サスペンションエンティティ
///
/// 通知書の処理時計を `start_at` から `end_at` まで停止する。
/// `revived_at` が設定されたら停止解除済み。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeSuspension {
    notice_no: NoticeNo,
    suspension_type: SuspensionType,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    revived_at: Option<DateTime<Utc>>,
}

/// 通知書サスペンションの DB 復元パラメータ
pub struct NoticeSuspensionRecord {
    pub notice_no: NoticeNo,
    pub suspension_type: SuspensionType,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub revived_at: Option<DateTime<Utc>>,
}

impl NoticeSuspension {
    /// TS-PDP サスペンションを新規作成する（21 日間の固定ウィンドウ）
    pub fn new_ts_pdp(notice_no: NoticeNo, now: DateTime<Utc>) -> Self {
        Self {
            notice_no,
            suspension_type: SuspensionType::TsPdp,
            start_at: now,
            end_at: now + Duration::days(TS_PDP_SUSPENSION_DAYS),
            revived_at: None,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: NoticeSuspensionRecord) -> Self {
        Self {
            notice_no: record.notice_no,
            suspension_type: record.suspension_type,
            start_at: record.start_at,
            end_at: record.end_at,
            revived_at: record.revived_at,
        }
    }

    pub fn notice_no(&self) -> &NoticeNo {
        &self.notice_no
    }

    pub fn suspension_type(&self) -> SuspensionType {
        self.suspension_type
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.start_at
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.end_at
    }

    pub fn revived_at(&self) -> Option<DateTime<Utc>> {
        self.revived_at
    }

    /// 停止が有効か（解除されていないか）
    pub fn is_active(&self) -> bool {
        self.revived_at.is_none()
    }

    /// サスペンションを解除した新しいインスタンスを返す
    ///
    /// 承認の処分時にのみ呼び出される。却下では呼び出さない。
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict`: 既に解除済みの場合
    pub fn revived(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.revived_at.is_some() {
            return Err(DomainError::Conflict(
                "サスペンションは既に解除されています".to_string(),
            ));
        }
        Ok(Self {
            revived_at: Some(now),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn notice_no() -> NoticeNo {
        NoticeNo::new("N2024-000123").unwrap()
    }

    #[test]
    fn test_新規作成で21日間のウィンドウが設定される() {
        let now = Utc::now();
        let suspension = NoticeSuspension::new_ts_pdp(notice_no(), now);

        assert_eq!(suspension.start_at(), now);
        assert_eq!(suspension.end_at() - suspension.start_at(), Duration::days(21));
        assert!(suspension.is_active());
    }

    #[test]
    fn test_解除後はis_activeがfalseになる() {
        let now = Utc::now();
        let suspension = NoticeSuspension::new_ts_pdp(notice_no(), now);

        let revived = suspension.revived(now).unwrap();

        assert!(!revived.is_active());
        assert_eq!(revived.revived_at(), Some(now));
    }

    #[test]
    fn test_解除済みの再解除はエラー() {
        let now = Utc::now();
        let suspension = NoticeSuspension::new_ts_pdp(notice_no(), now)
            .revived(now)
            .unwrap();

        let result = suspension.revived(now);

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_サスペンション種別コードの相互変換() {
        assert_eq!(SuspensionType::TsPdp.as_code(), "TS-PDP");
        assert_eq!(
            SuspensionType::from_str("TS-PDP").unwrap(),
            SuspensionType::TsPdp
        );
        assert!(SuspensionType::from_str("TS-XXX").is_err());
    }
}
