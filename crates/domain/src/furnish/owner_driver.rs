//! # 名宛人（OwnerDriver）
//!
//! 通知書ごとに「現在どの賃借人・運転者を名宛人として扱うか」を管理する。
//! 申告の承認（自動・手動）によってのみ作成・更新される。

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use super::application::{FurnishIdType, MailingAddress, OwnerDriverIndicator};
use crate::{
    DomainError,
    value_objects::{FurnishIdNo, FurnishName, NoticeNo, TxnNo},
};

/// 名宛人住所の取得元種別
///
/// `owner_driver_addrs` テーブルの複合キー `(notice_no, indicator,
/// type_of_address)` の一部。取得元ごとに 1 行を保持する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AddressType {
    /// LTA 登録住所
    LtaReg,
    /// LTA 郵送先住所
    LtaMail,
    /// MHA 登録住所
    MhaReg,
    /// 申告フォームで申告された郵送先住所
    FurnishedMail,
}

impl FromStr for AddressType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lta_reg" => Ok(Self::LtaReg),
            "lta_mail" => Ok(Self::LtaMail),
            "mha_reg" => Ok(Self::MhaReg),
            "furnished_mail" => Ok(Self::FurnishedMail),
            _ => Err(DomainError::Validation(format!("不正な住所種別: {}", s))),
        }
    }
}

/// 名宛人エンティティ
///
/// 複合キー `(notice_no, indicator)`。同一通知書に賃借人と運転者が
/// それぞれ最大 1 件存在しうる。`offender_indicator` が立っている
/// レコードが後続の通知・督促の宛先となる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerDriver {
    notice_no: NoticeNo,
    indicator: OwnerDriverIndicator,
    name: FurnishName,
    id_type: FurnishIdType,
    id_no: FurnishIdNo,
    offender_indicator: bool,
    source_txn_no: Option<TxnNo>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 名宛人の構築パラメータ
pub struct NewOwnerDriver {
    pub notice_no: NoticeNo,
    pub indicator: OwnerDriverIndicator,
    pub name: FurnishName,
    pub id_type: FurnishIdType,
    pub id_no: FurnishIdNo,
    pub offender_indicator: bool,
    pub source_txn_no: Option<TxnNo>,
    pub now: DateTime<Utc>,
}

/// 名宛人の DB 復元パラメータ
pub struct OwnerDriverRecord {
    pub notice_no: NoticeNo,
    pub indicator: OwnerDriverIndicator,
    pub name: FurnishName,
    pub id_type: FurnishIdType,
    pub id_no: FurnishIdNo,
    pub offender_indicator: bool,
    pub source_txn_no: Option<TxnNo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnerDriver {
    pub fn new(params: NewOwnerDriver) -> Self {
        Self {
            notice_no: params.notice_no,
            indicator: params.indicator,
            name: params.name,
            id_type: params.id_type,
            id_no: params.id_no,
            offender_indicator: params.offender_indicator,
            source_txn_no: params.source_txn_no,
            created_at: params.now,
            updated_at: params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: OwnerDriverRecord) -> Self {
        Self {
            notice_no: record.notice_no,
            indicator: record.indicator,
            name: record.name,
            id_type: record.id_type,
            id_no: record.id_no,
            offender_indicator: record.offender_indicator,
            source_txn_no: record.source_txn_no,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn notice_no(&self) -> &NoticeNo {
        &self.notice_no
    }

    pub fn indicator(&self) -> OwnerDriverIndicator {
        self.indicator
    }

    pub fn name(&self) -> &FurnishName {
        &self.name
    }

    pub fn id_type(&self) -> FurnishIdType {
        self.id_type
    }

    pub fn id_no(&self) -> &FurnishIdNo {
        &self.id_no
    }

    pub fn offender_indicator(&self) -> bool {
        self.offender_indicator
    }

    pub fn source_txn_no(&self) -> Option<&TxnNo> {
        self.source_txn_no.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// 名宛人住所
///
/// 複合キー `(notice_no, indicator, address_type)`。
/// `furnished_mail` 種別の行は申告承認時に申告フォームの住所で上書きされる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerDriverAddr {
    pub notice_no:    NoticeNo,
    pub indicator:    OwnerDriverIndicator,
    pub address_type: AddressType,
    pub address:      MailingAddress,
    pub updated_at:   DateTime<Utc>,
}
