//! # 違反通知書
//!
//! 交通違反通知書のドメインモデルを定義する。
//!
//! 通知書自体の発行・督促・裁判所送致は別システムの責務であり、
//! 本サービスは申告可否の判定と所有者連絡先の参照のみに使用する（読み取り専用）。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    value_objects::{NoticeNo, VehicleNo},
};

/// 通知書の処理ステージ
///
/// `notices` テーブルの `processing_stage` カラムに対応する。
/// 申告を受け付けられるのは初期段階のステージのみ。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoticeProcessingStage {
    /// 発行済み
    Issued,
    /// 督促状送付済み
    ReminderSent,
    /// 処理停止中（TS-PDP サスペンション適用中）
    Suspended,
    /// 出頭命令発行済み
    SummonsIssued,
    /// 完結（納付・取消など）
    Closed,
}

impl NoticeProcessingStage {
    /// このステージで申告（furnish）を受け付けられるか
    ///
    /// 出頭命令発行後・完結後の通知書には申告できない。
    pub fn is_furnishable(&self) -> bool {
        matches!(self, Self::Issued | Self::ReminderSent | Self::Suspended)
    }
}

impl std::str::FromStr for NoticeProcessingStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(Self::Issued),
            "reminder_sent" => Ok(Self::ReminderSent),
            "suspended" => Ok(Self::Suspended),
            "summons_issued" => Ok(Self::SummonsIssued),
            "closed" => Ok(Self::Closed),
            _ => Err(DomainError::Validation(format!(
                "不正な処理ステージ: {}",
                s
            ))),
        }
    }
}

/// 違反通知書エンティティ
///
/// 申告パイプラインが参照する通知書のスナップショット。
/// 本サービスからは一切更新しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    notice_no: NoticeNo,
    vehicle_no: VehicleNo,
    offence_date: NaiveDate,
    processing_stage: NoticeProcessingStage,
    owner_name: Option<String>,
    owner_email: Option<String>,
    issued_at: DateTime<Utc>,
}

/// 違反通知書の構築パラメータ
pub struct NewNotice {
    pub notice_no: NoticeNo,
    pub vehicle_no: VehicleNo,
    pub offence_date: NaiveDate,
    pub processing_stage: NoticeProcessingStage,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(params: NewNotice) -> Self {
        Self {
            notice_no: params.notice_no,
            vehicle_no: params.vehicle_no,
            offence_date: params.offence_date,
            processing_stage: params.processing_stage,
            owner_name: params.owner_name,
            owner_email: params.owner_email,
            issued_at: params.issued_at,
        }
    }

    pub fn notice_no(&self) -> &NoticeNo {
        &self.notice_no
    }

    pub fn vehicle_no(&self) -> &VehicleNo {
        &self.vehicle_no
    }

    pub fn offence_date(&self) -> NaiveDate {
        self.offence_date
    }

    pub fn processing_stage(&self) -> NoticeProcessingStage {
        self.processing_stage
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    pub fn owner_email(&self) -> Option<&str> {
        self.owner_email.as_deref()
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}
