//! # 申告申請（FurnishApplication）
//!
//! 申告 1 回分のレコードを管理する。作成後は審査担当官による
//! ステータス遷移と備考追記を除き、一切編集されない。
//!
//! 状態遷移は ADT（代数的データ型）で表現し、不正な状態を型レベルで防止する。
//! 合法な遷移は P→A（承認）と P→R（却下）のみで、A / R は終端状態。
//! 承認済み申告の却下や却下済み申告の再却下は `DomainError` となる
//! （暗黙の no-op にはしない）。

use std::{str::FromStr, sync::OnceLock};

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    value_objects::{FurnishIdNo, FurnishName, NoticeNo, TxnNo, VehicleNo, Version},
};

// =========================================================================
// FurnishStatus（申告ステータス）
// =========================================================================

/// 申告ステータス
///
/// DB には 1 文字コード（`P` / `A` / `R`）で格納される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FurnishStatus {
    /// 審査待ち
    #[serde(rename = "P")]
    Pending,
    /// 承認済み
    #[serde(rename = "A")]
    Approved,
    /// 却下済み
    #[serde(rename = "R")]
    Rejected,
}

impl FurnishStatus {
    /// DB 格納用の 1 文字コードを返す
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Approved => "A",
            Self::Rejected => "R",
        }
    }
}

impl FromStr for FurnishStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" => Ok(Self::Pending),
            "A" => Ok(Self::Approved),
            "R" => Ok(Self::Rejected),
            _ => Err(DomainError::Validation(format!(
                "不正な申告ステータス: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for FurnishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

// =========================================================================
// OwnerDriverIndicator（名宛人区分）
// =========================================================================

/// 名宛人区分（賃借人 / 運転者）
///
/// DB には 1 文字コード（`H` / `D`）で格納される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerDriverIndicator {
    /// 賃借人（Hirer）
    #[serde(rename = "H")]
    Hirer,
    /// 運転者（Driver）
    #[serde(rename = "D")]
    Driver,
}

impl OwnerDriverIndicator {
    /// DB 格納用の 1 文字コードを返す
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Hirer => "H",
            Self::Driver => "D",
        }
    }
}

impl FromStr for OwnerDriverIndicator {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" => Ok(Self::Hirer),
            "D" => Ok(Self::Driver),
            _ => Err(DomainError::Validation(format!(
                "名宛人区分は H または D である必要があります: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for OwnerDriverIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

// =========================================================================
// FurnishIdType（申告対象者 ID 種別）
// =========================================================================

/// 申告対象者の ID 種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FurnishIdType {
    /// シンガポール国民登録番号
    Nric,
    /// 外国人識別番号
    Fin,
    /// パスポート番号
    Passport,
    /// 事業体番号（法人申告用）
    Uen,
}

fn nric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[ST]\d{7}[A-Z]$").expect("NRIC 正規表現が不正"))
}

fn fin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[FGM]\d{7}[A-Z]$").expect("FIN 正規表現が不正"))
}

fn passport_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]{5,11}$").expect("パスポート正規表現が不正"))
}

fn uen_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{8,9}|[TSR]\d{2}[A-Z]{2}\d{4})[A-Z]$").expect("UEN 正規表現が不正")
    })
}

impl FurnishIdType {
    /// ID 番号がこの種別の形式に合致するか検証する
    ///
    /// 自動承認チェック（IDENTITY_FORMAT）から呼び出される。
    /// チェックディジットの検証は行わない（形式のみ）。
    pub fn matches_format(&self, id_no: &str) -> bool {
        match self {
            Self::Nric => nric_pattern().is_match(id_no),
            Self::Fin => fin_pattern().is_match(id_no),
            Self::Passport => passport_pattern().is_match(id_no),
            Self::Uen => uen_pattern().is_match(id_no),
        }
    }
}

impl FromStr for FurnishIdType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NRIC" => Ok(Self::Nric),
            "FIN" => Ok(Self::Fin),
            "PASSPORT" => Ok(Self::Passport),
            "UEN" => Ok(Self::Uen),
            _ => Err(DomainError::Validation(format!("不正な ID 種別: {}", s))),
        }
    }
}

// =========================================================================
// RejectionReasonCode（却下理由コード）
// =========================================================================

/// 却下理由コード
///
/// 審査担当官が却下時に選択する理由の閉集合。
/// 備考の追記行と却下メールの本文に使用される。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReasonCode {
    /// 申告内容に不備がある
    InvalidParticulars,
    /// 証憑が不足している
    InsufficientEvidence,
    /// 重複申告
    DuplicateSubmission,
    /// その他（自由記述を参照）
    Other,
}

// =========================================================================
// MailingAddress（郵送先住所）
// =========================================================================

/// 郵送先住所
///
/// 申告フォームで入力された住所。承認時には `furnished_mail`
/// 種別の名宛人住所としてそのまま書き込まれる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingAddress {
    pub block_no:      String,
    pub street_name:   String,
    pub floor_no:      Option<String>,
    pub unit_no:       Option<String>,
    pub building_name: Option<String>,
    pub postal_code:   String,
}

// =========================================================================
// FurnishQuestionAnswers（設問回答）
// =========================================================================

/// 申告フォームの設問回答（自由記述 3 問）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FurnishQuestionAnswers {
    /// 設問 1: 違反時の車両の利用状況
    pub question_1: String,
    /// 設問 2: 申告対象者との関係の経緯
    pub question_2: String,
    /// 設問 3: 補足事項
    pub question_3: String,
}

// =========================================================================
// RentalPeriod（レンタル期間）
// =========================================================================

/// レンタル期間（賃借人申告時のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    start: NaiveDate,
    end:   NaiveDate,
}

impl RentalPeriod {
    /// レンタル期間を作成する
    ///
    /// # エラー
    ///
    /// 開始日が終了日より後の場合は `DomainError::Validation` を返す。
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::Validation(
                "レンタル期間の開始日は終了日以前である必要があります".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 指定日が期間内（両端含む）か
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 別の期間と重複するか（両端含む）
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

// =========================================================================
// FurnishApplication（申告申請）
// =========================================================================

/// 申告申請の状態（ADT ベースステートマシン）
///
/// 各状態で有効なフィールドのみを持たせることで、不正な状態を型レベルで防止する。
/// `decided_at` は A / R 状態でのみ存在する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FurnishApplicationState {
    /// 審査待ち
    Pending,
    /// 承認済み（終端）
    Approved(DecidedState),
    /// 却下済み（終端）
    Rejected(DecidedState),
}

/// Approved / Rejected 共通の処分済み状態フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecidedState {
    /// 処分日時
    pub decided_at: DateTime<Utc>,
}

/// 申告申請エンティティ
///
/// 申告 1 回分のレコード。`txn_no` を主キーとし、
/// 再申告は常に新しいレコードとして作成される。
///
/// ## 楽観的ロック
///
/// `version` フィールドにより、並行更新時の競合を検出する。
/// 状態遷移時にインクリメントされ、更新時は期待バージョンと
/// DB 上のバージョンを比較する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurnishApplication {
    txn_no: TxnNo,
    notice_no: NoticeNo,
    vehicle_no: VehicleNo,
    offence_date: NaiveDate,
    furnish_name: FurnishName,
    furnish_id_type: FurnishIdType,
    furnish_id_no: FurnishIdNo,
    owner_driver_indicator: OwnerDriverIndicator,
    hirer_owner_relationship: Option<String>,
    mailing_address: MailingAddress,
    email: Option<String>,
    phone: Option<String>,
    question_answers: FurnishQuestionAnswers,
    rental_period: Option<RentalPeriod>,
    remarks: String,
    version: Version,
    submitted_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state: FurnishApplicationState,
}

/// 申告申請の新規作成パラメータ
pub struct NewFurnishApplication {
    pub txn_no: TxnNo,
    pub notice_no: NoticeNo,
    pub vehicle_no: VehicleNo,
    pub offence_date: NaiveDate,
    pub furnish_name: FurnishName,
    pub furnish_id_type: FurnishIdType,
    pub furnish_id_no: FurnishIdNo,
    pub owner_driver_indicator: OwnerDriverIndicator,
    pub hirer_owner_relationship: Option<String>,
    pub mailing_address: MailingAddress,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub question_answers: FurnishQuestionAnswers,
    pub rental_period: Option<RentalPeriod>,
    pub now: DateTime<Utc>,
}

/// 申告申請の DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して ADT に変換する。
pub struct FurnishApplicationRecord {
    pub txn_no: TxnNo,
    pub notice_no: NoticeNo,
    pub vehicle_no: VehicleNo,
    pub offence_date: NaiveDate,
    pub furnish_name: FurnishName,
    pub furnish_id_type: FurnishIdType,
    pub furnish_id_no: FurnishIdNo,
    pub owner_driver_indicator: OwnerDriverIndicator,
    pub hirer_owner_relationship: Option<String>,
    pub mailing_address: MailingAddress,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub question_answers: FurnishQuestionAnswers,
    pub rental_period: Option<RentalPeriod>,
    pub remarks: String,
    pub status: FurnishStatus,
    pub version: Version,
    pub decided_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FurnishApplication {
    /// 新しい申告申請を作成する（審査待ち状態）
    pub fn new(params: NewFurnishApplication) -> Self {
        Self {
            txn_no: params.txn_no,
            notice_no: params.notice_no,
            vehicle_no: params.vehicle_no,
            offence_date: params.offence_date,
            furnish_name: params.furnish_name,
            furnish_id_type: params.furnish_id_type,
            furnish_id_no: params.furnish_id_no,
            owner_driver_indicator: params.owner_driver_indicator,
            hirer_owner_relationship: params.hirer_owner_relationship,
            mailing_address: params.mailing_address,
            email: params.email,
            phone: params.phone,
            question_answers: params.question_answers,
            rental_period: params.rental_period,
            remarks: String::new(),
            version: Version::initial(),
            submitted_at: params.now,
            created_at: params.now,
            updated_at: params.now,
            state: FurnishApplicationState::Pending,
        }
    }

    /// 既存のデータから復元する
    ///
    /// DB のフラット構造から ADT に変換し、不変条件を検証する。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 不変条件違反（例: Approved で decided_at が
    ///   None）
    pub fn from_db(record: FurnishApplicationRecord) -> Result<Self, DomainError> {
        let state = match record.status {
            FurnishStatus::Pending => FurnishApplicationState::Pending,
            FurnishStatus::Approved => {
                let decided_at = record.decided_at.ok_or_else(|| {
                    DomainError::Validation(
                        "承認済み申告には decided_at が必要です".to_string(),
                    )
                })?;
                FurnishApplicationState::Approved(DecidedState { decided_at })
            }
            FurnishStatus::Rejected => {
                let decided_at = record.decided_at.ok_or_else(|| {
                    DomainError::Validation(
                        "却下済み申告には decided_at が必要です".to_string(),
                    )
                })?;
                FurnishApplicationState::Rejected(DecidedState { decided_at })
            }
        };

        Ok(Self {
            txn_no: record.txn_no,
            notice_no: record.notice_no,
            vehicle_no: record.vehicle_no,
            offence_date: record.offence_date,
            furnish_name: record.furnish_name,
            furnish_id_type: record.furnish_id_type,
            furnish_id_no: record.furnish_id_no,
            owner_driver_indicator: record.owner_driver_indicator,
            hirer_owner_relationship: record.hirer_owner_relationship,
            mailing_address: record.mailing_address,
            email: record.email,
            phone: record.phone,
            question_answers: record.question_answers,
            rental_period: record.rental_period,
            remarks: record.remarks,
            version: record.version,
            submitted_at: record.submitted_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            state,
        })
    }

    // Getter メソッド

    pub fn txn_no(&self) -> &TxnNo {
        &self.txn_no
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

    pub fn furnish_name(&self) -> &FurnishName {
        &self.furnish_name
    }

    pub fn furnish_id_type(&self) -> FurnishIdType {
        self.furnish_id_type
    }

    pub fn furnish_id_no(&self) -> &FurnishIdNo {
        &self.furnish_id_no
    }

    pub fn owner_driver_indicator(&self) -> OwnerDriverIndicator {
        self.owner_driver_indicator
    }

    pub fn hirer_owner_relationship(&self) -> Option<&str> {
        self.hirer_owner_relationship.as_deref()
    }

    pub fn mailing_address(&self) -> &MailingAddress {
        &self.mailing_address
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn question_answers(&self) -> &FurnishQuestionAnswers {
        &self.question_answers
    }

    pub fn rental_period(&self) -> Option<&RentalPeriod> {
        self.rental_period.as_ref()
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 状態への直接アクセス（パターンマッチ用）
    pub fn state(&self) -> &FurnishApplicationState {
        &self.state
    }

    pub fn status(&self) -> FurnishStatus {
        match &self.state {
            FurnishApplicationState::Pending => FurnishStatus::Pending,
            FurnishApplicationState::Approved(_) => FurnishStatus::Approved,
            FurnishApplicationState::Rejected(_) => FurnishStatus::Rejected,
        }
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            FurnishApplicationState::Pending => None,
            FurnishApplicationState::Approved(s) | FurnishApplicationState::Rejected(s) => {
                Some(s.decided_at)
            }
        }
    }

    // ビジネスロジックメソッド

    /// 申告を承認した新しいインスタンスを返す
    ///
    /// 自動承認と審査担当官による手動承認の両方で使用する。
    /// version をインクリメントして楽観的ロックに対応。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 審査待ち以外の状態で呼び出した場合
    pub fn approved(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            FurnishApplicationState::Pending => Ok(Self {
                state: FurnishApplicationState::Approved(DecidedState { decided_at: now }),
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            _ => Err(DomainError::Validation(format!(
                "承認は審査待ち状態でのみ可能です（現在: {}）",
                self.status()
            ))),
        }
    }

    /// 申告を却下した新しいインスタンスを返す
    ///
    /// version をインクリメントして楽観的ロックに対応。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 審査待ち以外の状態で呼び出した場合
    pub fn rejected(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            FurnishApplicationState::Pending => Ok(Self {
                state: FurnishApplicationState::Rejected(DecidedState { decided_at: now }),
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            _ => Err(DomainError::Validation(format!(
                "却下は審査待ち状態でのみ可能です（現在: {}）",
                self.status()
            ))),
        }
    }

    /// 備考を追記した新しいインスタンスを返す
    ///
    /// 備考は追記専用で、既存の内容を上書きしない。
    pub fn with_appended_remark(self, entry: &str, now: DateTime<Utc>) -> Self {
        let remarks = if self.remarks.is_empty() {
            entry.to_string()
        } else {
            format!("{}\n{}", self.remarks, entry)
        };
        Self {
            remarks,
            updated_at: now,
            ..self
        }
    }
}

// =========================================================================
// FurnishDocument（添付書類リンク）
// =========================================================================

/// 申告に添付された書類のリンク
///
/// 書類本体は外部のブロブストレージに格納されており、
/// ここでは参照キーとメタデータのみを保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurnishDocument {
    pub txn_no:      TxnNo,
    pub reference:   String,
    pub file_name:   String,
    pub uploaded_at: DateTime<Utc>,
}

impl FurnishDocument {
    pub fn new(
        txn_no: TxnNo,
        reference: impl Into<String>,
        file_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            txn_no,
            reference: reference.into(),
            file_name: file_name.into(),
            uploaded_at: now,
        }
    }
}
